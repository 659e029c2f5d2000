//! Use-case services.
//!
//! # Responsibility
//! - Turn request-shaped input (query maps, JSON bodies) into repository
//!   calls for one entity.
//! - Keep transport layers decoupled from parsing and storage details.

pub mod entity_service;
