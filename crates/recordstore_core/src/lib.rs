//! Backend-agnostic data access for schema-described records.
//! Filters, pagination and records are modelled once and compiled to SQL or
//! to document-store queries.

pub mod compile;
pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;
pub mod store;

pub use compile::{
    CompileError, CompileRequest, CompileResult, DocumentAction, DocumentCompiler, DocumentQuery,
    Operation, QueryCompiler, SqlCompiler, SqlQuery,
};
pub use config::{BackendConfig, ConfigError, LogConfig, StoreConfig};
pub use context::{Context, ContextError};
pub use db::{open_db, open_db_in_memory, open_mongo, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entity::Entity;
pub use model::error::{ParseError, ParseResult};
pub use model::fields::{Field, Fields};
pub use model::types::{Scalar, ScalarType};
pub use model::values::{Value, Values};
pub use query::condition::{
    conditions_from_map, Condition, ConditionOperator, LogicalJoin, Operand,
};
pub use query::pagination::{order_by_from_str, OrderBy, Pagination, Sort};
pub use repo::{
    DocumentDriver, DocumentOutcome, MongoRepository, RepoError, RepoResult, Repository,
    SqliteRepository,
};
pub use service::entity_service::{EntityService, QueryMap};
pub use store::{Store, StoreError};

/// Returns the crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
