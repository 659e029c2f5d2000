//! SQLite implementation of the persistence contract.
//!
//! # Responsibility
//! - Execute statements built by the SQL compiler on a borrowed connection.
//! - Decode rows positionally against the declared field kinds.
//!
//! # Invariants
//! - Create always stores a fresh UUID v4 under `id`.
//! - Booleans are stored as integers `0`/`1`.
//! - While a call runs, a progress handler aborts the statement once the
//!   call's context is cancelled or past its deadline.

use crate::compile::{sql, Operation, SqlQuery};
use crate::context::Context;
use crate::db::DbError;
use crate::model::fields::{Field, Fields};
use crate::model::types::{Scalar, ScalarType};
use crate::model::values::Values;
use crate::query::condition::Condition;
use crate::query::pagination::Pagination;
use crate::repo::{describe_conditions, log_call, RepoError, RepoResult, Repository};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode, Row};
use std::time::Instant;
use uuid::Uuid;

const BACKEND: &str = "sqlite";
const ID_FIELD: &str = "id";
/// VM instructions between two context probes.
const PROGRESS_INTERVAL_OPS: i32 = 1000;

/// SQLite-backed repository over any table whose columns match `Fields`.
pub struct SqliteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn run<T>(
        &self,
        ctx: &Context,
        operation: Operation,
        entity: &str,
        body: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let result = self.with_context(ctx, body);
        log_call(BACKEND, operation, entity, started_at, &result);
        result
    }

    fn with_context<T>(
        &self,
        ctx: &Context,
        body: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        ctx.check()?;

        let probe = ctx.clone();
        self.conn
            .progress_handler(PROGRESS_INTERVAL_OPS, Some(move || probe.is_done()));
        let result = body(self.conn);
        self.conn
            .progress_handler(PROGRESS_INTERVAL_OPS, None::<fn() -> bool>);

        match result {
            Err(RepoError::Db(DbError::Sqlite(err))) if is_interrupt(&err) => {
                match ctx.check() {
                    Err(context_err) => Err(context_err.into()),
                    Ok(()) => Err(err.into()),
                }
            }
            other => other,
        }
    }

    fn execute_write(
        &self,
        ctx: &Context,
        operation: Operation,
        entity: &str,
        query: SqlQuery,
        missing_key: impl FnOnce() -> String,
    ) -> RepoResult<()> {
        self.run(ctx, operation, entity, |conn| {
            let changed = execute(conn, operation, &query)?;
            if changed == 0 {
                return Err(RepoError::not_found(entity, missing_key()));
            }
            Ok(())
        })
    }
}

impl Repository for SqliteRepository<'_> {
    fn get(&self, ctx: &Context, entity: &str, fields: &Fields, id: &str) -> RepoResult<Values> {
        let query = sql::get(entity, fields, id);
        self.run(ctx, Operation::Get, entity, |conn| {
            let query = non_empty(Operation::Get, &query)?;
            let mut stmt = conn.prepare(&query.sql)?;
            let mut rows = stmt.query(params_from_iter(query.args.iter().map(scalar_to_sql)))?;
            let record = match rows.next()? {
                Some(row) => parse_row(row, fields)?,
                None => return Err(RepoError::not_found(entity, id)),
            };
            Ok(record)
        })
    }

    fn list(
        &self,
        ctx: &Context,
        entity: &str,
        fields: &Fields,
        pagination: &Pagination,
        conditions: &[Condition],
    ) -> RepoResult<Vec<Values>> {
        let query = sql::list(entity, fields, pagination, conditions);
        self.run(ctx, Operation::List, entity, |conn| {
            let query = non_empty(Operation::List, &query)?;
            let mut stmt = conn.prepare(&query.sql)?;
            let mut rows = stmt.query(params_from_iter(query.args.iter().map(scalar_to_sql)))?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(parse_row(row, fields)?);
            }
            Ok(records)
        })
    }

    fn create(&self, ctx: &Context, entity: &str, values: &Values) -> RepoResult<String> {
        let id = Uuid::new_v4().to_string();
        let mut record = values.clone();
        record.set(ID_FIELD, id.as_str());

        let query = sql::create(entity, &record);
        self.run(ctx, Operation::Create, entity, |conn| {
            execute(conn, Operation::Create, &query)?;
            Ok(id)
        })
    }

    fn update(&self, ctx: &Context, entity: &str, id: &str, values: &Values) -> RepoResult<()> {
        let mut record = values.clone();
        record.unset(ID_FIELD);

        let query = sql::update(entity, id, &record);
        self.execute_write(ctx, Operation::Update, entity, query, || id.to_string())
    }

    fn delete(&self, ctx: &Context, entity: &str, id: &str) -> RepoResult<()> {
        let query = sql::delete(entity, id);
        self.execute_write(ctx, Operation::Delete, entity, query, || id.to_string())
    }

    fn delete_where(
        &self,
        ctx: &Context,
        entity: &str,
        conditions: &[Condition],
    ) -> RepoResult<()> {
        let query = sql::delete_where(entity, conditions);
        self.execute_write(ctx, Operation::DeleteWhere, entity, query, || {
            describe_conditions(conditions)
        })
    }

    fn update_where(
        &self,
        ctx: &Context,
        entity: &str,
        values: &Values,
        conditions: &[Condition],
    ) -> RepoResult<()> {
        let mut record = values.clone();
        record.unset(ID_FIELD);

        let query = sql::update_where(entity, &record, conditions);
        self.execute_write(ctx, Operation::UpdateWhere, entity, query, || {
            describe_conditions(conditions)
        })
    }
}

fn non_empty(operation: Operation, query: &SqlQuery) -> RepoResult<&SqlQuery> {
    if query.is_empty() {
        return Err(RepoError::InvalidQuery(operation));
    }
    Ok(query)
}

fn execute(conn: &Connection, operation: Operation, query: &SqlQuery) -> RepoResult<usize> {
    let query = non_empty(operation, query)?;
    let changed = conn.execute(
        &query.sql,
        params_from_iter(query.args.iter().map(scalar_to_sql)),
    )?;
    Ok(changed)
}

fn is_interrupt(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(ErrorCode::OperationInterrupted)
}

fn scalar_to_sql(value: &Scalar) -> Value {
    match value {
        Scalar::Null => Value::Null,
        Scalar::Bool(value) => Value::Integer(i64::from(*value)),
        Scalar::Int64(value) => Value::Integer(*value),
        Scalar::Float64(value) => Value::Real(*value),
        Scalar::String(value) => Value::Text(value.clone()),
    }
}

/// Columns come back in field order, so decoding is positional.
fn parse_row(row: &Row<'_>, fields: &Fields) -> RepoResult<Values> {
    let mut values = Values::new();
    for (index, field) in fields.iter().enumerate() {
        let value = parse_column(field, row.get_ref(index)?)?;
        values.set(field.name.as_str(), value);
    }
    Ok(values)
}

fn parse_column(field: &Field, column: ValueRef<'_>) -> RepoResult<Scalar> {
    let value = match (field.kind, column) {
        (_, ValueRef::Null) => Scalar::Null,
        (ScalarType::Bool, ValueRef::Integer(0)) => Scalar::Bool(false),
        (ScalarType::Bool, ValueRef::Integer(1)) => Scalar::Bool(true),
        (ScalarType::Int64, ValueRef::Integer(value)) => Scalar::Int64(value),
        (ScalarType::Float64, ValueRef::Real(value)) => Scalar::Float64(value),
        (ScalarType::Float64, ValueRef::Integer(value)) => Scalar::Float64(value as f64),
        (ScalarType::String, ValueRef::Text(bytes)) => {
            let text = std::str::from_utf8(bytes).map_err(|_| {
                RepoError::InvalidData(format!("column `{}` is not valid UTF-8", field.name))
            })?;
            Scalar::String(text.to_string())
        }
        (kind, other) => {
            return Err(RepoError::InvalidData(format!(
                "column `{}` holds {:?} but field is {kind}",
                field.name,
                other.data_type()
            )));
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{parse_column, scalar_to_sql};
    use crate::model::fields::Field;
    use crate::model::types::{Scalar, ScalarType};
    use crate::repo::RepoError;
    use rusqlite::types::{Value, ValueRef};

    #[test]
    fn booleans_are_stored_as_integers() {
        assert_eq!(scalar_to_sql(&Scalar::Bool(true)), Value::Integer(1));
        assert_eq!(scalar_to_sql(&Scalar::Bool(false)), Value::Integer(0));
        assert_eq!(scalar_to_sql(&Scalar::Null), Value::Null);
    }

    #[test]
    fn columns_decode_by_field_kind() {
        let active = Field::new("active", ScalarType::Bool);
        assert_eq!(
            parse_column(&active, ValueRef::Integer(1)).unwrap(),
            Scalar::Bool(true)
        );

        let price = Field::new("price", ScalarType::Float64);
        assert_eq!(
            parse_column(&price, ValueRef::Integer(3)).unwrap(),
            Scalar::Float64(3.0)
        );
        assert_eq!(parse_column(&price, ValueRef::Null).unwrap(), Scalar::Null);
    }

    #[test]
    fn mismatched_column_is_invalid_data() {
        let stock = Field::new("stock", ScalarType::Int64);
        let err = parse_column(&stock, ValueRef::Text(b"many")).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("stock")));

        let active = Field::new("active", ScalarType::Bool);
        assert!(parse_column(&active, ValueRef::Integer(7)).is_err());
    }
}
