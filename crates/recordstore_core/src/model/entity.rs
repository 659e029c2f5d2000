//! Entity descriptor: a named table/collection plus its record schema.

use crate::model::fields::Fields;

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub fields: Fields,
}

impl Entity {
    pub fn new(name: impl Into<String>, fields: Fields) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}
