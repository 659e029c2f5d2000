//! Sort order and pagination window, plus their query-string forms.
//!
//! # Invariants
//! - Sort attributes always name schema fields.
//! - `limit == 0` means "no limit"; an offset only applies with a limit.

use crate::model::error::{ParseError, ParseResult};
use crate::model::fields::Fields;
use crate::model::types::ScalarType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const OFFSET_PARAM: &str = "__offset";
pub const LIMIT_PARAM: &str = "__limit";
pub const SORT_PARAM: &str = "__sort";

const DESCENDING_PREFIX: char = '-';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub attribute: String,
    pub sort: Sort,
}

impl OrderBy {
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            sort: Sort::Ascending,
        }
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            sort: Sort::Descending,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
    #[serde(default)]
    pub order: Vec<OrderBy>,
}

impl Pagination {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit,
            order: Vec::new(),
        }
    }

    pub fn with_order(mut self, order: Vec<OrderBy>) -> Self {
        self.order = order;
        self
    }

    /// Reads `__offset`, `__limit` and `__sort` from a parsed query string.
    ///
    /// Absent parameters keep their defaults (no offset, no limit, no order).
    pub fn from_query(query: &HashMap<String, Vec<String>>, fields: &Fields) -> ParseResult<Self> {
        let offset = single_integer(query, OFFSET_PARAM)?;
        let limit = single_integer(query, LIMIT_PARAM)?;
        let order = match single_value(query, SORT_PARAM)? {
            Some(raw) => order_by_from_str(raw, fields)?,
            None => Vec::new(),
        };

        Ok(Self {
            offset,
            limit,
            order,
        })
    }
}

/// Parses a comma-separated sort list such as `name,-age`.
///
/// A leading `-` sorts descending. Every attribute must be a schema field;
/// an empty input yields an empty list.
pub fn order_by_from_str(raw: &str, fields: &Fields) -> ParseResult<Vec<OrderBy>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    raw.split(',')
        .map(|token| {
            let order = match token.strip_prefix(DESCENDING_PREFIX) {
                Some(attribute) => OrderBy::desc(attribute),
                None => OrderBy::asc(token),
            };

            if fields.contains(&order.attribute) {
                Ok(order)
            } else {
                Err(ParseError::UnknownSortAttribute(order.attribute))
            }
        })
        .collect()
}

fn single_value<'q>(
    query: &'q HashMap<String, Vec<String>>,
    name: &str,
) -> ParseResult<Option<&'q str>> {
    match query.get(name).map(Vec::as_slice) {
        None => Ok(None),
        Some([value]) => Ok(Some(value.as_str())),
        Some(_) => Err(ParseError::MultipleValues(name.to_string())),
    }
}

fn single_integer(query: &HashMap<String, Vec<String>>, name: &str) -> ParseResult<u64> {
    let Some(raw) = single_value(query, name)? else {
        return Ok(0);
    };

    raw.parse::<u64>().map_err(|_| ParseError::ValueCoercion {
        attribute: name.to_string(),
        expected: ScalarType::Int64,
        literal: raw.to_string(),
    })
}
