//! Persistence contract and its backend implementations.
//!
//! # Responsibility
//! - Define the backend-neutral CRUD contract over schema-described records.
//! - Normalize driver outcomes into semantic errors.
//!
//! # Invariants
//! - Zero rows/documents affected by a by-id or by-condition write is
//!   `NotFound`; `get` with no match is `NotFound`; an empty `list` is success.
//! - A statement the compiler refuses is never sent to the driver.
//! - Repository logs carry operation metadata only, never record contents.

use crate::compile::document::DecodeError;
use crate::compile::{CompileError, Operation};
use crate::context::{Context, ContextError};
use crate::db::DbError;
use crate::model::error::ParseError;
use crate::model::fields::Fields;
use crate::model::values::Values;
use crate::query::condition::Condition;
use crate::query::pagination::Pagination;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub mod document_repo;
pub mod sqlite_repo;

pub use document_repo::{DocumentDriver, DocumentOutcome, MongoRepository};
pub use sqlite_repo::SqliteRepository;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Nothing matched `key` (an id or a condition summary) in `entity`.
    NotFound { entity: String, key: String },
    /// The compiler refused to build the statement for this operation.
    InvalidQuery(Operation),
    Compile(CompileError),
    /// Stored data does not fit the declared schema.
    InvalidData(String),
    Context(ContextError),
    Parse(ParseError),
}

impl RepoError {
    pub fn not_found(entity: &str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            key: key.into(),
        }
    }

    /// Stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db_error",
            Self::NotFound { .. } => "not_found",
            Self::InvalidQuery(_) => "invalid_query",
            Self::Compile(_) => "compile_error",
            Self::InvalidData(_) => "invalid_data",
            Self::Context(ContextError::Cancelled) => "cancelled",
            Self::Context(ContextError::DeadlineExceeded) => "deadline_exceeded",
            Self::Parse(_) => "parse_error",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::InvalidQuery(operation) => {
                write!(f, "refusing to execute empty {operation} query")
            }
            Self::Compile(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Context(err) => write!(f, "{err}"),
            Self::Parse(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Compile(err) => Some(err),
            Self::Context(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidQuery(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<mongodb::error::Error> for RepoError {
    fn from(value: mongodb::error::Error) -> Self {
        Self::Db(DbError::Mongo(value))
    }
}

impl From<CompileError> for RepoError {
    fn from(value: CompileError) -> Self {
        Self::Compile(value)
    }
}

impl From<DecodeError> for RepoError {
    fn from(value: DecodeError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

impl From<ContextError> for RepoError {
    fn from(value: ContextError) -> Self {
        Self::Context(value)
    }
}

impl From<ParseError> for RepoError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

/// Backend-neutral CRUD over records of a named entity.
///
/// Every call honours `ctx`: a cancelled or expired context fails with
/// [`RepoError::Context`] without reaching the store, and long-running
/// statements are interrupted where the backend allows it.
pub trait Repository {
    /// Fetches one record by id, decoded against `fields`.
    fn get(&self, ctx: &Context, entity: &str, fields: &Fields, id: &str) -> RepoResult<Values>;

    fn list(
        &self,
        ctx: &Context,
        entity: &str,
        fields: &Fields,
        pagination: &Pagination,
        conditions: &[Condition],
    ) -> RepoResult<Vec<Values>>;

    /// Inserts a record and returns the id it was stored under.
    fn create(&self, ctx: &Context, entity: &str, values: &Values) -> RepoResult<String>;

    /// Overwrites the given values of one record. An `id` entry in `values`
    /// is ignored.
    fn update(&self, ctx: &Context, entity: &str, id: &str, values: &Values) -> RepoResult<()>;

    fn delete(&self, ctx: &Context, entity: &str, id: &str) -> RepoResult<()>;

    /// Deletes every matching record. An empty condition list matches all.
    fn delete_where(&self, ctx: &Context, entity: &str, conditions: &[Condition])
        -> RepoResult<()>;

    /// Updates every matching record. An empty condition list matches all.
    /// An `id` entry in `values` is ignored, so primary keys never change.
    fn update_where(
        &self,
        ctx: &Context,
        entity: &str,
        values: &Values,
        conditions: &[Condition],
    ) -> RepoResult<()>;
}

impl<R: Repository + ?Sized> Repository for &R {
    fn get(&self, ctx: &Context, entity: &str, fields: &Fields, id: &str) -> RepoResult<Values> {
        (**self).get(ctx, entity, fields, id)
    }

    fn list(
        &self,
        ctx: &Context,
        entity: &str,
        fields: &Fields,
        pagination: &Pagination,
        conditions: &[Condition],
    ) -> RepoResult<Vec<Values>> {
        (**self).list(ctx, entity, fields, pagination, conditions)
    }

    fn create(&self, ctx: &Context, entity: &str, values: &Values) -> RepoResult<String> {
        (**self).create(ctx, entity, values)
    }

    fn update(&self, ctx: &Context, entity: &str, id: &str, values: &Values) -> RepoResult<()> {
        (**self).update(ctx, entity, id, values)
    }

    fn delete(&self, ctx: &Context, entity: &str, id: &str) -> RepoResult<()> {
        (**self).delete(ctx, entity, id)
    }

    fn delete_where(
        &self,
        ctx: &Context,
        entity: &str,
        conditions: &[Condition],
    ) -> RepoResult<()> {
        (**self).delete_where(ctx, entity, conditions)
    }

    fn update_where(
        &self,
        ctx: &Context,
        entity: &str,
        values: &Values,
        conditions: &[Condition],
    ) -> RepoResult<()> {
        (**self).update_where(ctx, entity, values, conditions)
    }
}

impl<R: Repository + ?Sized> Repository for Box<R> {
    fn get(&self, ctx: &Context, entity: &str, fields: &Fields, id: &str) -> RepoResult<Values> {
        (**self).get(ctx, entity, fields, id)
    }

    fn list(
        &self,
        ctx: &Context,
        entity: &str,
        fields: &Fields,
        pagination: &Pagination,
        conditions: &[Condition],
    ) -> RepoResult<Vec<Values>> {
        (**self).list(ctx, entity, fields, pagination, conditions)
    }

    fn create(&self, ctx: &Context, entity: &str, values: &Values) -> RepoResult<String> {
        (**self).create(ctx, entity, values)
    }

    fn update(&self, ctx: &Context, entity: &str, id: &str, values: &Values) -> RepoResult<()> {
        (**self).update(ctx, entity, id, values)
    }

    fn delete(&self, ctx: &Context, entity: &str, id: &str) -> RepoResult<()> {
        (**self).delete(ctx, entity, id)
    }

    fn delete_where(
        &self,
        ctx: &Context,
        entity: &str,
        conditions: &[Condition],
    ) -> RepoResult<()> {
        (**self).delete_where(ctx, entity, conditions)
    }

    fn update_where(
        &self,
        ctx: &Context,
        entity: &str,
        values: &Values,
        conditions: &[Condition],
    ) -> RepoResult<()> {
        (**self).update_where(ctx, entity, values, conditions)
    }
}

/// `NotFound` key for by-condition writes.
pub(crate) fn describe_conditions(conditions: &[Condition]) -> String {
    if conditions.is_empty() {
        return "all records".to_string();
    }
    conditions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Emits the `repo_call` event for one finished repository call.
pub(crate) fn log_call<T>(
    backend: &str,
    operation: Operation,
    entity: &str,
    started_at: Instant,
    result: &RepoResult<T>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => debug!(
            "event=repo_call module=repo status=ok backend={backend} op={operation} entity={entity} duration_ms={duration_ms}"
        ),
        Err(err) if err.is_not_found() => debug!(
            "event=repo_call module=repo status=not_found backend={backend} op={operation} entity={entity} duration_ms={duration_ms}"
        ),
        Err(err) => warn!(
            "event=repo_call module=repo status=error backend={backend} op={operation} entity={entity} duration_ms={duration_ms} error_code={}",
            err.code()
        ),
    }
}
