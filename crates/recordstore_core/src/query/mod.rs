//! Backend-neutral query vocabulary: filter conditions, sort order and
//! pagination, plus their parsing from request parameters.
//!
//! # Invariants
//! - Parsers consult `Fields` as the type oracle and never return partial
//!   results alongside an error.

pub mod condition;
pub mod pagination;
