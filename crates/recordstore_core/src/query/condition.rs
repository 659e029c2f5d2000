//! Filter condition algebra and the `field=[op:]literal` mini-language.
//!
//! # Responsibility
//! - Model filter predicates independently of any storage backend.
//! - Parse query-string filters against a schema.
//!
//! # Invariants
//! - Parsing is schema-scoped: keys without a matching field are ignored.
//! - Output order follows field order, not request order.
//! - Any parse error discards the whole condition list.

use crate::model::error::{ParseError, ParseResult};
use crate::model::fields::{Field, Fields};
use crate::model::types::{Scalar, ScalarType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

const OPERATOR_SEPARATOR: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Like,
    In,
    NotIn,
}

impl ConditionOperator {
    /// Resolves a mini-language operator code (`eq`, `ne`, `gt`, `gte`, `lt`,
    /// `lte`, `li`).
    ///
    /// Set operators have no code; they are only built programmatically.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "eq" => Some(Self::Equals),
            "ne" => Some(Self::NotEquals),
            "gt" => Some(Self::GreaterThan),
            "gte" => Some(Self::GreaterOrEqual),
            "lt" => Some(Self::LessThan),
            "lte" => Some(Self::LessOrEqual),
            "li" => Some(Self::Like),
            _ => None,
        }
    }

    pub fn code(self) -> Option<&'static str> {
        match self {
            Self::Equals => Some("eq"),
            Self::NotEquals => Some("ne"),
            Self::GreaterThan => Some("gt"),
            Self::GreaterOrEqual => Some("gte"),
            Self::LessThan => Some("lt"),
            Self::LessOrEqual => Some("lte"),
            Self::Like => Some("li"),
            Self::In | Self::NotIn => None,
        }
    }

    pub fn is_set_operator(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Whether a field of `kind` may be filtered with this operator.
    pub fn supports(self, kind: ScalarType) -> bool {
        match kind {
            ScalarType::Bool => matches!(self, Self::Equals | Self::NotEquals),
            ScalarType::String => true,
            ScalarType::Int64 | ScalarType::Float64 => self != Self::Like,
        }
    }
}

impl Display for ConditionOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::GreaterOrEqual => "greater_or_equal",
            Self::LessThan => "less_than",
            Self::LessOrEqual => "less_or_equal",
            Self::Like => "like",
            Self::In => "in",
            Self::NotIn => "not_in",
        };
        f.write_str(name)
    }
}

/// How a condition combines with its predecessors.
///
/// Only `And` is compiled today; `Or` is carried for callers that already
/// tag their conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalJoin {
    #[default]
    And,
    Or,
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    One(Scalar),
    /// Candidate list for `In` / `NotIn`.
    Many(Vec<Scalar>),
}

macro_rules! impl_operand_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for Operand {
                fn from(value: $source) -> Self {
                    Self::One(Scalar::from(value))
                }
            }
        )*
    };
}

impl_operand_from!(Scalar, bool, &str, String, i64, i32, f64);

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub operator: ConditionOperator,
    pub value: Operand,
    pub join: LogicalJoin,
}

impl Condition {
    pub fn new(
        attribute: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<Operand>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            value: value.into(),
            join: LogicalJoin::And,
        }
    }

    pub fn equals(attribute: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::new(attribute, ConditionOperator::Equals, value.into())
    }

    /// `attribute IN (values...)`.
    pub fn any_of(attribute: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self::new(attribute, ConditionOperator::In, Operand::Many(values))
    }

    /// `attribute NOT IN (values...)`.
    pub fn none_of(attribute: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self::new(attribute, ConditionOperator::NotIn, Operand::Many(values))
    }

    pub fn with_join(mut self, join: LogicalJoin) -> Self {
        self.join = join;
        self
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One(value) => write!(f, "{value}"),
            Self::Many(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Renders as `attribute operator operand`, e.g. `stock less_than 10`.
impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.attribute, self.operator, self.value)
    }
}

/// Parses query-string filters into conditions, using `fields` as the type
/// oracle.
///
/// Each schema field present in `query` must carry exactly one value of the
/// form `[op:]literal`. A value with no `:` is an equality test; otherwise
/// the text before the first `:` must be a known operator code.
///
/// A repeated filter key fails the whole parse; it is never skipped, and
/// the remaining filters are not applied without it.
///
/// # Errors
/// - `MultipleValues` when a field has zero or several values.
/// - `InvalidConditionOperator` for unknown codes, `li` on non-strings, or
///   relational operators on booleans.
/// - `ValueCoercion` when the literal does not parse as the field kind.
pub fn conditions_from_map(
    query: &HashMap<String, Vec<String>>,
    fields: &Fields,
) -> ParseResult<Vec<Condition>> {
    let mut conditions = Vec::new();

    for field in fields {
        let Some(raw_values) = query.get(&field.name) else {
            continue;
        };

        let [raw] = raw_values.as_slice() else {
            return Err(ParseError::MultipleValues(field.name.clone()));
        };

        conditions.push(parse_condition(field, raw)?);
    }

    Ok(conditions)
}

fn parse_condition(field: &Field, raw: &str) -> ParseResult<Condition> {
    let (operator, literal) = match raw.split_once(OPERATOR_SEPARATOR) {
        Some((code, literal)) => {
            let operator = ConditionOperator::from_code(code).ok_or_else(|| {
                ParseError::InvalidConditionOperator {
                    attribute: field.name.clone(),
                    operator: code.to_string(),
                }
            })?;
            (operator, literal)
        }
        None => (ConditionOperator::Equals, raw),
    };

    if !operator.supports(field.kind) {
        return Err(ParseError::InvalidConditionOperator {
            attribute: field.name.clone(),
            operator: operator.code().unwrap_or_default().to_string(),
        });
    }

    let value = field
        .kind
        .coerce(literal)
        .ok_or_else(|| ParseError::ValueCoercion {
            attribute: field.name.clone(),
            expected: field.kind,
            literal: literal.to_string(),
        })?;

    Ok(Condition::new(field.name.clone(), operator, value))
}
