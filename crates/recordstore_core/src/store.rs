//! Configured backend handle.
//!
//! # Responsibility
//! - Open the backend named by a [`StoreConfig`].
//! - Hand out a backend-neutral [`Repository`] over it.

use crate::config::{BackendConfig, StoreConfig};
use crate::db::{open_db, open_db_in_memory, open_mongo};
use crate::logging::init_logging;
use crate::repo::{MongoRepository, RepoError, RepoResult, Repository, SqliteRepository};
use mongodb::sync::Database;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum StoreError {
    Logging(crate::logging::LoggingError),
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<crate::logging::LoggingError> for StoreError {
    fn from(value: crate::logging::LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub enum Store {
    Sqlite(Connection),
    Mongo(MongoRepository<Database>),
}

impl Store {
    /// Starts logging when configured, then opens the backend.
    pub fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        if let Some(logging) = &config.logging {
            init_logging(logging)?;
        }
        Ok(Self::open(&config.backend)?)
    }

    pub fn open(backend: &BackendConfig) -> RepoResult<Self> {
        let store = match backend {
            BackendConfig::Sqlite { path: Some(path) } => Self::Sqlite(open_db(path)?),
            BackendConfig::Sqlite { path: None } => Self::Sqlite(open_db_in_memory()?),
            BackendConfig::Mongo { uri, database } => {
                Self::Mongo(MongoRepository::new(open_mongo(uri, database)?))
            }
        };
        Ok(store)
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Mongo(_) => "mongo",
        }
    }

    /// SQLite connection for schema management; `None` on other backends.
    pub fn sqlite_connection(&self) -> Option<&Connection> {
        match self {
            Self::Sqlite(conn) => Some(conn),
            Self::Mongo(_) => None,
        }
    }

    pub fn repository(&self) -> Box<dyn Repository + '_> {
        match self {
            Self::Sqlite(conn) => Box::new(SqliteRepository::new(conn)),
            Self::Mongo(repo) => Box::new(repo),
        }
    }
}
