//! Query compilers: translate records, conditions and pagination into
//! engine-native statements.
//!
//! # Responsibility
//! - Define the narrow interface shared by the SQL and document compilers.
//! - Keep each backend's output shape independent.
//!
//! # Invariants
//! - Compilation is pure and never blocks.
//! - A compiler either produces a complete statement or refuses; it never
//!   emits a partial one.

use crate::model::fields::Fields;
use crate::model::values::Values;
use crate::query::condition::{Condition, ConditionOperator};
use crate::query::pagination::Pagination;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod document;
pub mod sql;

pub use document::{DocumentAction, DocumentCompiler, DocumentQuery};
pub use sql::{SqlCompiler, SqlQuery};

pub type CompileResult<T> = Result<T, CompileError>;

/// Reasons the document compiler refuses an input.
///
/// The SQL compiler signals refusal with an empty [`SqlQuery`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    MissingEntity,
    MissingId,
    EmptyValues,
    /// Condition or sort attribute is empty.
    InvalidAttribute(String),
    /// Operator cannot be applied to the given operand.
    InvalidOperator {
        attribute: String,
        operator: ConditionOperator,
    },
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEntity => write!(f, "entity name is empty"),
            Self::MissingId => write!(f, "record id is empty"),
            Self::EmptyValues => write!(f, "no values to write"),
            Self::InvalidAttribute(attribute) => write!(f, "invalid attribute `{attribute}`"),
            Self::InvalidOperator {
                attribute,
                operator,
            } => write!(f, "operator `{operator}` cannot be applied to `{attribute}`"),
        }
    }
}

impl Error for CompileError {}

/// Statement kinds every compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    List,
    Create,
    Update,
    UpdateWhere,
    Delete,
    DeleteWhere,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::UpdateWhere => "update_where",
            Self::Delete => "delete",
            Self::DeleteWhere => "delete_where",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared compiler input. Each operation reads only the parts it needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileRequest<'a> {
    pub entity: &'a str,
    pub id: Option<&'a str>,
    pub fields: Option<&'a Fields>,
    pub values: Option<&'a Values>,
    pub conditions: &'a [Condition],
    pub pagination: Option<&'a Pagination>,
}

impl<'a> CompileRequest<'a> {
    pub fn new(entity: &'a str) -> Self {
        Self {
            entity,
            ..Self::default()
        }
    }

    pub fn id(mut self, id: &'a str) -> Self {
        self.id = Some(id);
        self
    }

    pub fn fields(mut self, fields: &'a Fields) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn values(mut self, values: &'a Values) -> Self {
        self.values = Some(values);
        self
    }

    pub fn conditions(mut self, conditions: &'a [Condition]) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn pagination(mut self, pagination: &'a Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

pub trait QueryCompiler {
    type Output;

    fn compile(&self, operation: Operation, request: &CompileRequest<'_>) -> Self::Output;
}
