//! Record schema: ordered, uniquely named, typed fields.
//!
//! # Responsibility
//! - Declare the shape of an entity's records.
//! - Act as the type oracle for condition, sort and body parsing.
//!
//! # Invariants
//! - Field order is insertion order and fixes generated column order.
//! - Re-declaring a name only replaces its kind.

use crate::model::ordered::{Iter, Keyed, OrderedMap};
use crate::model::types::ScalarType;
use crate::model::values::Values;
use std::fmt::{Display, Formatter};

const REQUIRED_PREFIX: char = '+';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: ScalarType,
    pub required: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }

    pub fn required(name: impl Into<String>, kind: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }
}

impl Keyed for Field {
    fn key(&self) -> &str {
        &self.name
    }
}

/// Ordered field set. Not synchronized; share behind a lock if needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: OrderedMap<Field>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` with `kind`.
    ///
    /// A leading `+` marks the field required and is stripped from the name.
    /// An existing field keeps its position and required flag; only its kind
    /// is replaced.
    pub fn set(&mut self, name: &str, kind: ScalarType) -> &mut Self {
        let field = match name.strip_prefix(REQUIRED_PREFIX) {
            Some(stripped) => Field::required(stripped, kind),
            None => Field::new(name, kind),
        };
        self.insert(field)
    }

    /// Adds a fully described field, with the same replacement rule as `set`.
    pub fn insert(&mut self, field: Field) -> &mut Self {
        match self.entries.get_mut(&field.name) {
            Some(existing) => existing.kind = field.kind,
            None => {
                self.entries.insert(field);
            }
        }
        self
    }

    pub fn unset(&mut self, name: &str) -> Option<Field> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    pub fn type_of(&self, name: &str) -> Option<ScalarType> {
        self.get(name).map(|field| field.kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Field> {
        self.entries.iter()
    }

    /// Builds a record holding each field's type default, in field order.
    pub fn default_values(&self) -> Values {
        self.iter()
            .map(|field| (field.name.clone(), field.kind.default_value()))
            .collect()
    }
}

impl FromIterator<Field> for Fields {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        let mut fields = Self::new();
        for field in iter {
            fields.insert(field);
        }
        fields
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a Field;
    type IntoIter = Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for Fields {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (position, field) in self.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", field.name, field.kind)?;
            if field.required {
                f.write_str("!")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Field, Fields};
    use crate::model::types::{Scalar, ScalarType};

    #[test]
    fn set_then_get_returns_declared_field() {
        let mut fields = Fields::new();
        fields.set("name", ScalarType::String);

        let field = fields.get("name").expect("field should exist");
        assert_eq!(field.kind, ScalarType::String);
        assert!(!field.required);
        assert_eq!(fields.type_of("missing"), None);
    }

    #[test]
    fn plus_prefix_marks_required() {
        let mut fields = Fields::new();
        fields.set("+email", ScalarType::String);

        assert!(fields.get("+email").is_none());
        assert!(fields.get("email").expect("stripped name").required);
    }

    #[test]
    fn duplicate_set_replaces_kind_in_place() {
        let mut fields = Fields::new();
        fields
            .set("+a", ScalarType::String)
            .set("b", ScalarType::Int64)
            .set("c", ScalarType::Bool);
        fields.set("a", ScalarType::Float64);

        assert_eq!(fields.len(), 3);
        let names: Vec<_> = fields.iter().map(|field| field.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        let a = fields.get("a").unwrap();
        assert_eq!(a.kind, ScalarType::Float64);
        assert!(a.required);
    }

    #[test]
    fn unset_sole_field_empties_collection() {
        let mut fields = Fields::new();
        fields.set("only", ScalarType::Int64);
        assert!(fields.unset("only").is_some());
        assert!(fields.is_empty());
        assert_eq!(fields.len(), 0);
    }

    #[test]
    fn default_values_follow_field_order() {
        let fields: Fields = [
            Field::new("active", ScalarType::Bool),
            Field::new("name", ScalarType::String),
            Field::new("stock", ScalarType::Int64),
        ]
        .into_iter()
        .collect();

        let values = fields.default_values();
        let pairs: Vec<_> = values
            .iter()
            .map(|value| (value.name.as_str(), value.value.clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("active", Scalar::Bool(true)),
                ("name", Scalar::String(String::new())),
                ("stock", Scalar::Int64(0)),
            ]
        );
    }

    #[test]
    fn display_marks_required_fields() {
        let mut fields = Fields::new();
        fields.set("+name", ScalarType::String).set("age", ScalarType::Int64);
        assert_eq!(fields.to_string(), "name:string!, age:int64");
    }
}
