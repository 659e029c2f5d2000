//! Store configuration loaded from JSON.
//!
//! # Invariants
//! - A loaded config has passed [`StoreConfig::validate`].
//! - A SQLite backend without `path` runs in memory.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "malformed config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Sqlite {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Mongo {
        uri: String,
        database: String,
    },
}

impl BackendConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => "sqlite",
            Self::Mongo { .. } => "mongo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    pub dir: PathBuf,
}

fn default_level() -> String {
    crate::logging::default_log_level().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub logging: Option<LogConfig>,
}

impl StoreConfig {
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let BackendConfig::Mongo { uri, database } = &self.backend {
            if uri.trim().is_empty() {
                return Err(ConfigError::Invalid("mongo uri cannot be empty".to_string()));
            }
            if database.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "mongo database cannot be empty".to_string(),
                ));
            }
        }
        if let Some(logging) = &self.logging {
            if logging.dir.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("log dir cannot be empty".to_string()));
            }
        }
        Ok(())
    }
}
