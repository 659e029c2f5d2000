//! Storage bootstrap for the supported backends.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Open MongoDB databases through the synchronous driver.
//! - Wrap driver failures in one transport error type.
//!
//! # Invariants
//! - Callers own table/collection layout; bootstrap never creates schema.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod mongo;
mod open;

pub use mongo::open_mongo;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Mongo(mongodb::error::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Mongo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Mongo(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<mongodb::error::Error> for DbError {
    fn from(value: mongodb::error::Error) -> Self {
        Self::Mongo(value)
    }
}
