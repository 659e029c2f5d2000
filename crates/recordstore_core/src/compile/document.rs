//! Document-store compiler: operator-tagged filter and update documents for
//! MongoDB-style drivers.
//!
//! # Invariants
//! - Filter entries mirror condition order, one entry per condition.
//! - Conditions on distinct attributes collapse into one flat filter;
//!   repeated attributes are combined under `$and` so none is overwritten.
//! - The conventional `id` field is stored under the native `_id` key; a
//!   24-hex-digit id is an ObjectId, any other id stays a string.
//! - Like patterns are passed through verbatim as `$regex`.
//! - Decoding never guesses: a stored type that does not fit the field kind
//!   is a [`DecodeError`].

use crate::compile::{CompileError, CompileRequest, CompileResult, Operation, QueryCompiler};
use crate::model::fields::{Field, Fields};
use crate::model::types::{Scalar, ScalarType};
use crate::model::values::Values;
use crate::query::condition::{Condition, ConditionOperator, Operand};
use crate::query::pagination::{OrderBy, Pagination, Sort};
use bson::oid::ObjectId;
use bson::spec::ElementType;
use bson::{Bson, Document};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ID_FIELD: &str = "id";
pub const NATIVE_ID_FIELD: &str = "_id";

const AND_OPERATOR: &str = "$and";
const SET_OPERATOR: &str = "$set";

/// Compiled document-store operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub collection: String,
    pub filter: Document,
    pub action: DocumentAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentAction {
    FindOne,
    Find {
        skip: Option<u64>,
        limit: Option<i64>,
        sort: Option<Document>,
    },
    InsertOne(Document),
    UpdateOne(Document),
    UpdateMany(Document),
    DeleteOne,
    DeleteMany,
}

/// Ordered `(attribute, {$op: value})` pairs, one per condition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    entries: Vec<(String, Document)>,
}

impl Filter {
    pub fn entries(&self) -> &[(String, Document)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the driver-facing filter document.
    pub fn into_document(self) -> Document {
        let unique = {
            let mut seen = HashSet::with_capacity(self.entries.len());
            self.entries
                .iter()
                .all(|(attribute, _)| seen.insert(attribute.as_str()))
        };

        if unique {
            return self
                .entries
                .into_iter()
                .map(|(attribute, filter)| (attribute, Bson::Document(filter)))
                .collect();
        }

        let clauses = self
            .entries
            .into_iter()
            .map(|(attribute, filter)| {
                let mut clause = Document::new();
                clause.insert(attribute, filter);
                Bson::Document(clause)
            })
            .collect::<Vec<_>>();

        let mut document = Document::new();
        document.insert(AND_OPERATOR, clauses);
        document
    }
}

pub fn operator_tag(operator: ConditionOperator) -> &'static str {
    match operator {
        ConditionOperator::Equals => "$eq",
        ConditionOperator::NotEquals => "$ne",
        ConditionOperator::GreaterThan => "$gt",
        ConditionOperator::GreaterOrEqual => "$gte",
        ConditionOperator::LessThan => "$lt",
        ConditionOperator::LessOrEqual => "$lte",
        ConditionOperator::Like => "$regex",
        ConditionOperator::In => "$in",
        ConditionOperator::NotIn => "$nin",
    }
}

pub fn scalar_to_bson(value: &Scalar) -> Bson {
    match value {
        Scalar::Null => Bson::Null,
        Scalar::Bool(value) => Bson::Boolean(*value),
        Scalar::String(value) => Bson::String(value.clone()),
        Scalar::Int64(value) => Bson::Int64(*value),
        Scalar::Float64(value) => Bson::Double(*value),
    }
}

/// Store-native representation of a conventional id.
pub fn native_id(id: &str) -> Bson {
    match ObjectId::parse_str(id) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(id.to_string()),
    }
}

/// Conventional string form of a native id.
pub fn id_from_native(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(value) => value.clone(),
        other => other.to_string(),
    }
}

fn storage_key(attribute: &str) -> &str {
    if attribute == ID_FIELD {
        NATIVE_ID_FIELD
    } else {
        attribute
    }
}

fn operand_to_bson(attribute: &str, value: &Scalar) -> Bson {
    match value {
        Scalar::String(id) if attribute == ID_FIELD => native_id(id),
        other => scalar_to_bson(other),
    }
}

/// Maps each condition to an operator-tagged sub-document.
///
/// # Errors
/// - `InvalidAttribute` for an empty attribute.
/// - `InvalidOperator` for a non-string Like pattern or a list operand on a
///   non-set operator.
pub fn conditions_to_filter(conditions: &[Condition]) -> CompileResult<Filter> {
    let mut entries = Vec::with_capacity(conditions.len());

    for condition in conditions {
        let attribute = condition.attribute.as_str();
        if attribute.is_empty() {
            return Err(CompileError::InvalidAttribute(condition.attribute.clone()));
        }

        let operator = condition.operator;
        let invalid = || CompileError::InvalidOperator {
            attribute: condition.attribute.clone(),
            operator,
        };

        let operand = match (&condition.value, operator) {
            (Operand::One(Scalar::String(pattern)), ConditionOperator::Like) => {
                Bson::String(pattern.clone())
            }
            (Operand::One(_), ConditionOperator::Like) => return Err(invalid()),
            (Operand::One(value), _) if operator.is_set_operator() => {
                Bson::Array(vec![operand_to_bson(attribute, value)])
            }
            (Operand::One(value), _) => operand_to_bson(attribute, value),
            (Operand::Many(values), _) if operator.is_set_operator() => Bson::Array(
                values
                    .iter()
                    .map(|value| operand_to_bson(attribute, value))
                    .collect(),
            ),
            (Operand::Many(_), _) => return Err(invalid()),
        };

        let mut filter = Document::new();
        filter.insert(operator_tag(operator), operand);
        entries.push((storage_key(attribute).to_string(), filter));
    }

    Ok(Filter { entries })
}

/// Flat key/value document for writes, `id` stored as `_id`.
pub fn values_to_document(values: &Values) -> Document {
    values
        .iter()
        .map(|entry| {
            (
                storage_key(&entry.name).to_string(),
                operand_to_bson(&entry.name, &entry.value),
            )
        })
        .collect()
}

/// Stored value whose BSON type does not fit the declared field kind.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    pub key: String,
    pub expected: ScalarType,
    pub found: ElementType,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "key `{}` holds {:?} but field is {}",
            self.key, self.found, self.expected
        )
    }
}

impl Error for DecodeError {}

/// Decodes a stored document against `fields`; absent keys read as null.
///
/// Only declared fields come back, in field order. `_id` is read for a
/// declared `id` and decoded by that field's kind like any other value.
/// Integers widen to floats and ObjectIds read as hex strings.
pub fn document_to_values(found: &Document, fields: &Fields) -> Result<Values, DecodeError> {
    let mut values = Values::new();

    for field in fields {
        let value = match found.get(storage_key(&field.name)) {
            None | Some(Bson::Null) => Scalar::Null,
            Some(stored) => bson_to_scalar(field, stored)?,
        };
        values.set(field.name.as_str(), value);
    }

    Ok(values)
}

fn bson_to_scalar(field: &Field, stored: &Bson) -> Result<Scalar, DecodeError> {
    let value = match (field.kind, stored) {
        (ScalarType::Bool, Bson::Boolean(value)) => Scalar::Bool(*value),
        (ScalarType::Int64, Bson::Int32(value)) => Scalar::Int64(i64::from(*value)),
        (ScalarType::Int64, Bson::Int64(value)) => Scalar::Int64(*value),
        (ScalarType::Float64, Bson::Double(value)) => Scalar::Float64(*value),
        (ScalarType::Float64, Bson::Int32(value)) => Scalar::Float64(f64::from(*value)),
        (ScalarType::Float64, Bson::Int64(value)) => Scalar::Float64(*value as f64),
        (ScalarType::String, Bson::String(value)) => Scalar::String(value.clone()),
        (ScalarType::String, Bson::ObjectId(oid)) => Scalar::String(oid.to_hex()),
        (kind, other) => {
            return Err(DecodeError {
                key: field.name.clone(),
                expected: kind,
                found: other.element_type(),
            });
        }
    };
    Ok(value)
}

/// Sort specification (`1` ascending, `-1` descending) in order.
pub fn order_to_sort(order: &[OrderBy]) -> CompileResult<Document> {
    let mut sort = Document::new();
    for item in order {
        if item.attribute.is_empty() {
            return Err(CompileError::InvalidAttribute(item.attribute.clone()));
        }
        let direction = match item.sort {
            Sort::Ascending => 1,
            Sort::Descending => -1,
        };
        sort.insert(storage_key(&item.attribute), Bson::Int32(direction));
    }
    Ok(sort)
}

fn require_entity(entity: &str) -> CompileResult<()> {
    if entity.is_empty() {
        return Err(CompileError::MissingEntity);
    }
    Ok(())
}

fn id_filter(id: &str) -> CompileResult<Document> {
    if id.is_empty() {
        return Err(CompileError::MissingId);
    }
    let mut filter = Document::new();
    filter.insert(NATIVE_ID_FIELD, native_id(id));
    Ok(filter)
}

fn set_document(values: &Values) -> CompileResult<Document> {
    let mut fields = values.clone();
    fields.unset(ID_FIELD);
    if fields.is_empty() {
        return Err(CompileError::EmptyValues);
    }

    let mut update = Document::new();
    update.insert(SET_OPERATOR, values_to_document(&fields));
    Ok(update)
}

pub fn get(entity: &str, id: &str) -> CompileResult<DocumentQuery> {
    require_entity(entity)?;
    Ok(DocumentQuery {
        collection: entity.to_string(),
        filter: id_filter(id)?,
        action: DocumentAction::FindOne,
    })
}

/// Find with skip/limit/sort. As in the SQL dialect, an offset only applies
/// together with a nonzero limit.
pub fn list(
    entity: &str,
    pagination: &Pagination,
    conditions: &[Condition],
) -> CompileResult<DocumentQuery> {
    require_entity(entity)?;
    let filter = conditions_to_filter(conditions)?.into_document();

    let limit = (pagination.limit != 0)
        .then(|| i64::try_from(pagination.limit).unwrap_or(i64::MAX));
    let skip = (limit.is_some() && pagination.offset != 0).then_some(pagination.offset);
    let sort = if pagination.order.is_empty() {
        None
    } else {
        Some(order_to_sort(&pagination.order)?)
    };

    Ok(DocumentQuery {
        collection: entity.to_string(),
        filter,
        action: DocumentAction::Find { skip, limit, sort },
    })
}

pub fn create(entity: &str, values: &Values) -> CompileResult<DocumentQuery> {
    require_entity(entity)?;
    if values.is_empty() {
        return Err(CompileError::EmptyValues);
    }
    Ok(DocumentQuery {
        collection: entity.to_string(),
        filter: Document::new(),
        action: DocumentAction::InsertOne(values_to_document(values)),
    })
}

/// `$set` update by id; an `id` entry in `values` is never written.
pub fn update(entity: &str, id: &str, values: &Values) -> CompileResult<DocumentQuery> {
    require_entity(entity)?;
    let filter = id_filter(id)?;
    Ok(DocumentQuery {
        collection: entity.to_string(),
        filter,
        action: DocumentAction::UpdateOne(set_document(values)?),
    })
}

pub fn update_where(
    entity: &str,
    values: &Values,
    conditions: &[Condition],
) -> CompileResult<DocumentQuery> {
    require_entity(entity)?;
    let update = set_document(values)?;
    Ok(DocumentQuery {
        collection: entity.to_string(),
        filter: conditions_to_filter(conditions)?.into_document(),
        action: DocumentAction::UpdateMany(update),
    })
}

pub fn delete(entity: &str, id: &str) -> CompileResult<DocumentQuery> {
    require_entity(entity)?;
    Ok(DocumentQuery {
        collection: entity.to_string(),
        filter: id_filter(id)?,
        action: DocumentAction::DeleteOne,
    })
}

pub fn delete_where(entity: &str, conditions: &[Condition]) -> CompileResult<DocumentQuery> {
    require_entity(entity)?;
    Ok(DocumentQuery {
        collection: entity.to_string(),
        filter: conditions_to_filter(conditions)?.into_document(),
        action: DocumentAction::DeleteMany,
    })
}

/// [`QueryCompiler`] front for the document functions in this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCompiler;

impl QueryCompiler for DocumentCompiler {
    type Output = CompileResult<DocumentQuery>;

    fn compile(&self, operation: Operation, request: &CompileRequest<'_>) -> Self::Output {
        let entity = request.entity;
        let id = request.id.unwrap_or_default();
        let empty = Values::new();
        let values = request.values.unwrap_or(&empty);

        match operation {
            Operation::Get => get(entity, id),
            Operation::List => {
                let pagination = request.pagination.cloned().unwrap_or_default();
                list(entity, &pagination, request.conditions)
            }
            Operation::Create => create(entity, values),
            Operation::Update => update(entity, id, values),
            Operation::UpdateWhere => update_where(entity, values, request.conditions),
            Operation::Delete => delete(entity, id),
            Operation::DeleteWhere => delete_where(entity, request.conditions),
        }
    }
}
