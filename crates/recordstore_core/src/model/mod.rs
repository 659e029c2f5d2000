//! Dynamic record model.
//!
//! # Responsibility
//! - Define the scalar type system, schemas (`Fields`) and record instances
//!   (`Values`) shared by parsers, compilers and repositories.
//!
//! # Invariants
//! - `Fields` and `Values` are insertion-ordered with unique names.
//! - Records are independent of the schema that validated them.

pub mod entity;
pub mod error;
pub mod fields;
pub mod ordered;
pub mod types;
pub mod values;
