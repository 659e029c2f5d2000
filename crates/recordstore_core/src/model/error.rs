//! Errors raised while turning raw request input into typed records,
//! conditions and pagination.
//!
//! # Invariants
//! - Parsing is all-or-nothing: any error discards the partial result.

use crate::model::types::ScalarType;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Operator code unknown, or not allowed for the field's kind.
    InvalidConditionOperator { attribute: String, operator: String },
    /// Sort token names no field in the schema.
    UnknownSortAttribute(String),
    /// Literal cannot be read as the declared kind.
    ValueCoercion {
        attribute: String,
        expected: ScalarType,
        literal: String,
    },
    /// Required field absent from an inbound record.
    MissingRequiredValue(String),
    /// A single-valued parameter was given zero or several values.
    MultipleValues(String),
    /// Request body is not a JSON object.
    InvalidJson(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConditionOperator {
                attribute,
                operator,
            } => write!(f, "invalid condition operator `{operator}` for `{attribute}`"),
            Self::UnknownSortAttribute(attribute) => {
                write!(f, "unknown sort attribute `{attribute}`")
            }
            Self::ValueCoercion {
                attribute,
                expected,
                literal,
            } => write!(
                f,
                "value `{literal}` for `{attribute}` is not a valid {expected}"
            ),
            Self::MissingRequiredValue(attribute) => {
                write!(f, "mandatory value missing: `{attribute}`")
            }
            Self::MultipleValues(attribute) => {
                write!(f, "expected exactly one value for `{attribute}`")
            }
            Self::InvalidJson(message) => write!(f, "invalid json body: {message}"),
        }
    }
}

impl Error for ParseError {}

impl From<serde_json::Error> for ParseError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidJson(value.to_string())
    }
}
