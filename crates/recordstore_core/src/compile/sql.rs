//! SQL compiler: parameterized statements in the backtick/`?` dialect
//! understood by MySQL and SQLite.
//!
//! # Invariants
//! - Identifiers are always backtick-quoted; embedded backticks are doubled.
//! - Values only ever travel as positional arguments, never as SQL text.
//! - Argument order matches placeholder order exactly.
//! - An empty `sql` means "do not execute" and always has empty `args`.

use crate::compile::{CompileRequest, Operation, QueryCompiler};
use crate::model::fields::Fields;
use crate::model::types::Scalar;
use crate::model::values::Values;
use crate::query::condition::{Condition, ConditionOperator, Operand};
use crate::query::pagination::{Pagination, Sort};

const ID_COLUMN: &str = "`id`";

/// Parameterized statement ready for execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub args: Vec<Scalar>,
}

impl SqlQuery {
    fn new(sql: String, args: Vec<Scalar>) -> Self {
        Self { sql, args }
    }

    /// Whether the compiler refused the input.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Comma-joined quoted column list in field order.
pub fn select_field_names(fields: &Fields) -> String {
    fields
        .iter()
        .map(|field| quote_identifier(&field.name))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn operator_sql(operator: ConditionOperator) -> &'static str {
    match operator {
        ConditionOperator::Equals => "=",
        ConditionOperator::NotEquals => "<>",
        ConditionOperator::GreaterThan => ">",
        ConditionOperator::GreaterOrEqual => ">=",
        ConditionOperator::LessThan => "<",
        ConditionOperator::LessOrEqual => "<=",
        ConditionOperator::Like => "LIKE",
        ConditionOperator::In => "IN",
        ConditionOperator::NotIn => "NOT IN",
    }
}

fn sort_sql(sort: Sort) -> &'static str {
    match sort {
        Sort::Ascending => "ASC",
        Sort::Descending => "DESC",
    }
}

/// Renders ` WHERE ...` (leading space included) and its arguments.
///
/// No conditions yields an empty clause. Returns `None` when a condition
/// cannot be expressed.
pub fn conditions_to_where(conditions: &[Condition]) -> Option<(String, Vec<Scalar>)> {
    if conditions.is_empty() {
        return Some((String::new(), Vec::new()));
    }

    let mut clauses = Vec::with_capacity(conditions.len());
    let mut args = Vec::with_capacity(conditions.len());

    for condition in conditions {
        if condition.attribute.is_empty() {
            return None;
        }
        let column = quote_identifier(&condition.attribute);
        let operator = condition.operator;

        match &condition.value {
            Operand::One(Scalar::Null) => match operator {
                ConditionOperator::Equals => clauses.push(format!("{column} IS NULL")),
                ConditionOperator::NotEquals => clauses.push(format!("{column} IS NOT NULL")),
                _ => return None,
            },
            Operand::One(value) if operator.is_set_operator() => {
                clauses.push(format!("{column} {} (?)", operator_sql(operator)));
                args.push(value.clone());
            }
            Operand::One(value) => {
                clauses.push(format!("{column} {} ?", operator_sql(operator)));
                args.push(value.clone());
            }
            Operand::Many(values) if operator.is_set_operator() && !values.is_empty() => {
                let placeholders = vec!["?"; values.len()].join(",");
                clauses.push(format!("{column} {} ({placeholders})", operator_sql(operator)));
                args.extend(values.iter().cloned());
            }
            Operand::Many(_) => return None,
        }
    }

    Some((format!(" WHERE {}", clauses.join(" AND ")), args))
}

/// Renders ` ORDER BY ...` and ` LIMIT ...` (leading spaces included).
///
/// `LIMIT` is omitted when `limit` is zero and written `offset,limit` only
/// when the offset is nonzero. Returns `None` for an empty sort attribute.
pub fn pagination_to_order_by(pagination: &Pagination) -> Option<String> {
    let mut clause = String::new();

    if !pagination.order.is_empty() {
        let mut terms = Vec::with_capacity(pagination.order.len());
        for order in &pagination.order {
            if order.attribute.is_empty() {
                return None;
            }
            terms.push(format!(
                "{} {}",
                quote_identifier(&order.attribute),
                sort_sql(order.sort)
            ));
        }
        clause.push_str(" ORDER BY ");
        clause.push_str(&terms.join(", "));
    }

    if pagination.limit != 0 {
        if pagination.offset == 0 {
            clause.push_str(&format!(" LIMIT {}", pagination.limit));
        } else {
            clause.push_str(&format!(" LIMIT {},{}", pagination.offset, pagination.limit));
        }
    }

    Some(clause)
}

/// Renders `SET a = ?, b = ?` in value order with its arguments.
pub fn values_to_set(values: &Values) -> (String, Vec<Scalar>) {
    let mut assignments = Vec::with_capacity(values.len());
    let mut args = Vec::with_capacity(values.len());

    for entry in values {
        assignments.push(format!("{} = ?", quote_identifier(&entry.name)));
        args.push(entry.value.clone());
    }

    (format!("SET {}", assignments.join(", ")), args)
}

/// `SELECT <cols> FROM <entity> WHERE id = ?`.
pub fn get(entity: &str, fields: &Fields, id: &str) -> SqlQuery {
    if entity.is_empty() || id.is_empty() || fields.is_empty() {
        return SqlQuery::default();
    }

    SqlQuery::new(
        format!(
            "SELECT {} FROM {} WHERE {ID_COLUMN} = ?",
            select_field_names(fields),
            quote_identifier(entity)
        ),
        vec![Scalar::from(id)],
    )
}

/// `SELECT <cols> FROM <entity> [WHERE ...] [ORDER BY ...] [LIMIT ...]`.
pub fn list(
    entity: &str,
    fields: &Fields,
    pagination: &Pagination,
    conditions: &[Condition],
) -> SqlQuery {
    if entity.is_empty() || fields.is_empty() {
        return SqlQuery::default();
    }

    let Some((where_clause, args)) = conditions_to_where(conditions) else {
        return SqlQuery::default();
    };
    let Some(tail) = pagination_to_order_by(pagination) else {
        return SqlQuery::default();
    };

    SqlQuery::new(
        format!(
            "SELECT {} FROM {}{where_clause}{tail}",
            select_field_names(fields),
            quote_identifier(entity)
        ),
        args,
    )
}

/// `INSERT INTO <entity> (<cols>) VALUES (?, ...)` in value order.
pub fn create(entity: &str, values: &Values) -> SqlQuery {
    if entity.is_empty() || values.is_empty() {
        return SqlQuery::default();
    }

    let mut columns = Vec::with_capacity(values.len());
    let mut args = Vec::with_capacity(values.len());
    for entry in values {
        columns.push(quote_identifier(&entry.name));
        args.push(entry.value.clone());
    }

    SqlQuery::new(
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(entity),
            columns.join(","),
            vec!["?"; args.len()].join(",")
        ),
        args,
    )
}

/// `UPDATE <entity> SET ... WHERE id = ?`, id bound last.
pub fn update(entity: &str, id: &str, values: &Values) -> SqlQuery {
    if entity.is_empty() || id.is_empty() || values.is_empty() {
        return SqlQuery::default();
    }

    let (set, mut args) = values_to_set(values);
    args.push(Scalar::from(id));

    SqlQuery::new(
        format!("UPDATE {} {set} WHERE {ID_COLUMN} = ?", quote_identifier(entity)),
        args,
    )
}

/// `UPDATE <entity> SET ... [WHERE ...]`, SET arguments before WHERE ones.
pub fn update_where(entity: &str, values: &Values, conditions: &[Condition]) -> SqlQuery {
    if entity.is_empty() || values.is_empty() {
        return SqlQuery::default();
    }

    let Some((where_clause, where_args)) = conditions_to_where(conditions) else {
        return SqlQuery::default();
    };
    let (set, mut args) = values_to_set(values);
    args.extend(where_args);

    SqlQuery::new(
        format!("UPDATE {} {set}{where_clause}", quote_identifier(entity)),
        args,
    )
}

/// `DELETE FROM <entity> WHERE id = ?`.
pub fn delete(entity: &str, id: &str) -> SqlQuery {
    if entity.is_empty() || id.is_empty() {
        return SqlQuery::default();
    }

    SqlQuery::new(
        format!("DELETE FROM {} WHERE {ID_COLUMN} = ?", quote_identifier(entity)),
        vec![Scalar::from(id)],
    )
}

/// `DELETE FROM <entity> [WHERE ...]`.
pub fn delete_where(entity: &str, conditions: &[Condition]) -> SqlQuery {
    if entity.is_empty() {
        return SqlQuery::default();
    }

    let Some((where_clause, args)) = conditions_to_where(conditions) else {
        return SqlQuery::default();
    };

    SqlQuery::new(
        format!("DELETE FROM {}{where_clause}", quote_identifier(entity)),
        args,
    )
}

/// [`QueryCompiler`] front for the SQL functions in this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlCompiler;

impl QueryCompiler for SqlCompiler {
    type Output = SqlQuery;

    fn compile(&self, operation: Operation, request: &CompileRequest<'_>) -> SqlQuery {
        let entity = request.entity;
        let id = request.id.unwrap_or_default();
        let pagination = request.pagination.cloned().unwrap_or_default();

        match (operation, request.fields, request.values) {
            (Operation::Get, Some(fields), _) => get(entity, fields, id),
            (Operation::List, Some(fields), _) => {
                list(entity, fields, &pagination, request.conditions)
            }
            (Operation::Create, _, Some(values)) => create(entity, values),
            (Operation::Update, _, Some(values)) => update(entity, id, values),
            (Operation::UpdateWhere, _, Some(values)) => {
                update_where(entity, values, request.conditions)
            }
            (Operation::Delete, _, _) => delete(entity, id),
            (Operation::DeleteWhere, _, _) => delete_where(entity, request.conditions),
            _ => SqlQuery::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{conditions_to_where, pagination_to_order_by, quote_identifier};
    use crate::model::types::Scalar;
    use crate::query::condition::{Condition, ConditionOperator};
    use crate::query::pagination::{OrderBy, Pagination};

    #[test]
    fn identifiers_escape_backticks() {
        assert_eq!(quote_identifier("name"), "`name`");
        assert_eq!(quote_identifier("na`me"), "`na``me`");
    }

    #[test]
    fn where_clause_renders_every_operator() {
        let cases = [
            (ConditionOperator::Equals, " WHERE `a` = ?"),
            (ConditionOperator::NotEquals, " WHERE `a` <> ?"),
            (ConditionOperator::GreaterThan, " WHERE `a` > ?"),
            (ConditionOperator::GreaterOrEqual, " WHERE `a` >= ?"),
            (ConditionOperator::LessThan, " WHERE `a` < ?"),
            (ConditionOperator::LessOrEqual, " WHERE `a` <= ?"),
            (ConditionOperator::Like, " WHERE `a` LIKE ?"),
            (ConditionOperator::In, " WHERE `a` IN (?)"),
            (ConditionOperator::NotIn, " WHERE `a` NOT IN (?)"),
        ];
        for (operator, expected) in cases {
            let (sql, args) =
                conditions_to_where(&[Condition::new("a", operator, 1i64)]).unwrap();
            assert_eq!(sql, expected);
            assert_eq!(args, vec![Scalar::Int64(1)]);
        }
    }

    #[test]
    fn where_clause_expands_lists_and_nulls() {
        let conditions = [
            Condition::any_of("color", vec![Scalar::from("red"), Scalar::from("blue")]),
            Condition::equals("deleted_at", Scalar::Null),
            Condition::new("owner", ConditionOperator::NotEquals, Scalar::Null),
            Condition::none_of("stock", vec![Scalar::Int64(0)]),
        ];
        let (sql, args) = conditions_to_where(&conditions).unwrap();
        assert_eq!(
            sql,
            " WHERE `color` IN (?,?) AND `deleted_at` IS NULL AND `owner` IS NOT NULL AND `stock` NOT IN (?)"
        );
        assert_eq!(
            args,
            vec![Scalar::from("red"), Scalar::from("blue"), Scalar::Int64(0)]
        );
    }

    #[test]
    fn where_clause_refuses_inexpressible_conditions() {
        assert!(conditions_to_where(&[Condition::equals("", 1i64)]).is_none());
        assert!(conditions_to_where(&[Condition::new(
            "a",
            ConditionOperator::GreaterThan,
            Scalar::Null
        )])
        .is_none());
        assert!(conditions_to_where(&[Condition::any_of("a", Vec::new())]).is_none());

        let mut misuse = Condition::any_of("a", vec![Scalar::Int64(1)]);
        misuse.operator = ConditionOperator::Equals;
        assert!(conditions_to_where(&[misuse]).is_none());
    }

    #[test]
    fn order_and_limit_clauses() {
        assert_eq!(pagination_to_order_by(&Pagination::default()).unwrap(), "");
        assert_eq!(
            pagination_to_order_by(&Pagination::new(0, 10)).unwrap(),
            " LIMIT 10"
        );
        assert_eq!(
            pagination_to_order_by(&Pagination::new(5, 10)).unwrap(),
            " LIMIT 5,10"
        );
        assert_eq!(pagination_to_order_by(&Pagination::new(5, 0)).unwrap(), "");
        assert_eq!(
            pagination_to_order_by(
                &Pagination::new(0, 3).with_order(vec![OrderBy::asc("name"), OrderBy::desc("age")])
            )
            .unwrap(),
            " ORDER BY `name` ASC, `age` DESC LIMIT 3"
        );
        assert!(pagination_to_order_by(&Pagination::default().with_order(vec![OrderBy::asc("")]))
            .is_none());
    }
}
