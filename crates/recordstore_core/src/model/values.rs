//! Record instance: ordered, uniquely named, dynamically typed values.
//!
//! # Responsibility
//! - Carry one full or partial record between parsers, compilers and
//!   repositories.
//!
//! # Invariants
//! - Value order is insertion order and fixes INSERT column order, SET order
//!   and positional argument order.
//! - A `Values` keeps no reference to the `Fields` that validated it.

use crate::model::error::{ParseError, ParseResult};
use crate::model::fields::{Field, Fields};
use crate::model::ordered::{Iter, Keyed, OrderedMap};
use crate::model::types::{Scalar, ScalarType};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// One named value of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub name: String,
    pub value: Scalar,
}

impl Keyed for Value {
    fn key(&self) -> &str {
        &self.name
    }
}

/// Ordered value set. Not synchronized; share behind a lock if needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    entries: OrderedMap<Value>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, appending it or replacing its value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Scalar>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.entries.get_mut(&name) {
            Some(existing) => existing.value = value,
            None => {
                self.entries.insert(Value { name, value });
            }
        }
        self
    }

    pub fn unset(&mut self, name: &str) -> Option<Scalar> {
        self.entries.remove(name).map(|entry| entry.value)
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Value> {
        self.entries.iter()
    }

    /// Builds a record from an unordered map; order follows map iteration.
    pub fn from_map(map: HashMap<String, Scalar>) -> Self {
        map.into_iter().collect()
    }

    pub fn to_map(&self) -> HashMap<String, Scalar> {
        self.iter()
            .map(|entry| (entry.name.clone(), entry.value.clone()))
            .collect()
    }

    /// Decodes a JSON object body against `fields`.
    ///
    /// Values come out in field order. Keys outside the schema are ignored,
    /// optional fields missing from the body are skipped, and JSON `null`
    /// becomes [`Scalar::Null`].
    ///
    /// # Errors
    /// - `InvalidJson` when the body is not a JSON object.
    /// - `MissingRequiredValue` when a required field is absent or null.
    /// - `ValueCoercion` when a value does not match its field kind.
    pub fn from_json(body: &str, fields: &Fields) -> ParseResult<Self> {
        let parsed: serde_json::Value = serde_json::from_str(body)?;
        let object = parsed
            .as_object()
            .ok_or_else(|| ParseError::InvalidJson("expected a json object".to_string()))?;

        let mut values = Self::new();
        for field in fields {
            match object.get(&field.name) {
                None | Some(serde_json::Value::Null) if field.required => {
                    return Err(ParseError::MissingRequiredValue(field.name.clone()));
                }
                None => continue,
                Some(raw) => {
                    values.set(field.name.clone(), json_to_scalar(field, raw)?);
                }
            }
        }

        Ok(values)
    }
}

fn json_to_scalar(field: &Field, raw: &serde_json::Value) -> ParseResult<Scalar> {
    if raw.is_null() {
        return Ok(Scalar::Null);
    }

    let scalar = match field.kind {
        ScalarType::Bool => raw.as_bool().map(Scalar::Bool),
        ScalarType::String => raw.as_str().map(Scalar::from),
        ScalarType::Int64 => raw.as_i64().map(Scalar::Int64),
        ScalarType::Float64 => raw.as_f64().map(Scalar::Float64),
    };

    scalar.ok_or_else(|| ParseError::ValueCoercion {
        attribute: field.name.clone(),
        expected: field.kind,
        literal: raw.to_string(),
    })
}

impl<N: Into<String>> FromIterator<(N, Scalar)> for Values {
    fn from_iter<I: IntoIterator<Item = (N, Scalar)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (name, value) in iter {
            values.set(name, value);
        }
        values
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = &'a Value;
    type IntoIter = Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Values {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for entry in self {
            map.serialize_entry(&entry.name, &entry.value)?;
        }
        map.end()
    }
}

impl Display for Values {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (position, entry) in self.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", entry.name, entry.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Values;
    use crate::model::error::ParseError;
    use crate::model::fields::Fields;
    use crate::model::types::{Scalar, ScalarType};
    use std::collections::HashMap;

    fn product_fields() -> Fields {
        let mut fields = Fields::new();
        fields
            .set("+name", ScalarType::String)
            .set("price", ScalarType::Float64)
            .set("stock", ScalarType::Int64)
            .set("active", ScalarType::Bool);
        fields
    }

    #[test]
    fn set_then_get_and_replace_keeps_position() {
        let mut values = Values::new();
        values.set("name", "Apple").set("price", 3.5).set("stock", 10i64);
        assert_eq!(values.get("price"), Some(&Scalar::Float64(3.5)));

        values.set("name", "Pear");
        assert_eq!(values.len(), 3);
        assert_eq!(values.iter().next().map(|v| v.name.as_str()), Some("name"));
        assert_eq!(values.get("name"), Some(&Scalar::from("Pear")));
    }

    #[test]
    fn unset_sole_value_empties_collection() {
        let mut values = Values::new();
        values.set("id", "abc");
        assert_eq!(values.unset("id"), Some(Scalar::from("abc")));
        assert!(values.is_empty());
        assert_eq!(values.len(), 0);
        assert_eq!(values.unset("id"), None);
    }

    #[test]
    fn map_round_trip_preserves_pairs() {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Scalar::from("Apple"));
        map.insert("price".to_string(), Scalar::Float64(3.5));
        map.insert("deleted".to_string(), Scalar::Null);

        let values = Values::from_map(map.clone());
        assert_eq!(values.len(), 3);
        assert_eq!(values.to_map(), map);
    }

    #[test]
    fn from_json_follows_field_order_and_ignores_unknown_keys() {
        let body = r#"{"active": false, "unknown": 1, "price": 3, "name": "Apple"}"#;
        let values = Values::from_json(body, &product_fields()).unwrap();

        let names: Vec<_> = values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["name", "price", "active"]);
        assert_eq!(values.get("price"), Some(&Scalar::Float64(3.0)));
        assert_eq!(values.get("active"), Some(&Scalar::Bool(false)));
    }

    #[test]
    fn from_json_rejects_missing_required_value() {
        let err = Values::from_json(r#"{"price": 1.5}"#, &product_fields()).unwrap_err();
        assert_eq!(err, ParseError::MissingRequiredValue("name".to_string()));

        let err = Values::from_json(r#"{"name": null}"#, &product_fields()).unwrap_err();
        assert_eq!(err, ParseError::MissingRequiredValue("name".to_string()));
    }

    #[test]
    fn from_json_rejects_kind_mismatch() {
        let err = Values::from_json(r#"{"name": "x", "stock": 2.5}"#, &product_fields())
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::ValueCoercion { ref attribute, expected: ScalarType::Int64, .. }
                if attribute == "stock"
        ));

        let err = Values::from_json(r#"{"name": 5}"#, &product_fields()).unwrap_err();
        assert!(matches!(err, ParseError::ValueCoercion { .. }));
    }

    #[test]
    fn from_json_maps_null_and_rejects_non_objects() {
        let values = Values::from_json(r#"{"name": "x", "stock": null}"#, &product_fields())
            .unwrap();
        assert_eq!(values.get("stock"), Some(&Scalar::Null));

        let err = Values::from_json("[1, 2]", &product_fields()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
        let err = Values::from_json("{", &product_fields()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
    }

    #[test]
    fn serializes_as_ordered_object() {
        let mut values = Values::new();
        values.set("z", 1i64).set("a", Scalar::Null).set("m", "x");
        assert_eq!(
            serde_json::to_string(&values).unwrap(),
            r#"{"z":1,"a":null,"m":"x"}"#
        );
        assert_eq!(values.to_string(), r#"z:1, a:null, m:"x""#);
    }
}
