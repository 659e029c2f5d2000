//! Scalar type system shared by schemas, records and conditions.
//!
//! # Responsibility
//! - Define the closed set of scalar kinds a field can declare.
//! - Provide type-directed defaults and string coercion.
//!
//! # Invariants
//! - Coercion is strict: booleans accept only `true`/`false`, numbers use
//!   locale-free parsing.
//! - `Scalar::Null` carries no kind and stands for an absent/NULL value.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Declared kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    String,
    Int64,
    Float64,
}

impl ScalarType {
    /// Stable wire name (`bool`, `string`, `int64`, `float64`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
        }
    }

    /// Default value used when a record is seeded from a schema.
    ///
    /// Booleans default to `true`, matching the stored-record convention of
    /// the records this crate reads and writes.
    pub fn default_value(self) -> Scalar {
        match self {
            Self::Bool => Scalar::Bool(true),
            Self::String => Scalar::String(String::new()),
            Self::Int64 => Scalar::Int64(0),
            Self::Float64 => Scalar::Float64(0.0),
        }
    }

    /// Coerces a raw literal into a scalar of this kind.
    ///
    /// Returns `None` when the literal is not a valid value of the kind.
    pub fn coerce(self, literal: &str) -> Option<Scalar> {
        match self {
            Self::Bool => match literal {
                "true" => Some(Scalar::Bool(true)),
                "false" => Some(Scalar::Bool(false)),
                _ => None,
            },
            Self::String => Some(Scalar::String(literal.to_string())),
            Self::Int64 => literal.parse::<i64>().ok().map(Scalar::Int64),
            Self::Float64 => literal.parse::<f64>().ok().map(Scalar::Float64),
        }
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bool" => Ok(Self::Bool),
            "string" => Ok(Self::String),
            "int64" => Ok(Self::Int64),
            "float64" => Ok(Self::Float64),
            other => Err(format!(
                "unsupported scalar type `{other}`; expected bool|string|int64|float64"
            )),
        }
    }
}

/// Dynamically-typed runtime value.
///
/// Serialized untagged, so JSON `null`, `true`, `"x"`, `5` and `5.5` map to
/// the matching variants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
}

impl Scalar {
    /// Returns the kind held, or `None` for `Null`.
    pub fn kind(&self) -> Option<ScalarType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ScalarType::Bool),
            Self::String(_) => Some(ScalarType::String),
            Self::Int64(_) => Some(ScalarType::Int64),
            Self::Float64(_) => Some(ScalarType::Float64),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(value) => Some(*value),
            _ => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value:?}"),
            Self::Int64(value) => write!(f, "{value}"),
            Self::Float64(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int64(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::{Scalar, ScalarType};

    #[test]
    fn bool_coercion_is_strict() {
        assert_eq!(ScalarType::Bool.coerce("true"), Some(Scalar::Bool(true)));
        assert_eq!(ScalarType::Bool.coerce("false"), Some(Scalar::Bool(false)));
        assert_eq!(ScalarType::Bool.coerce("True"), None);
        assert_eq!(ScalarType::Bool.coerce("0"), None);
        assert_eq!(ScalarType::Bool.coerce("No"), None);
    }

    #[test]
    fn numeric_coercion_uses_plain_parsing() {
        assert_eq!(ScalarType::Int64.coerce("12500"), Some(Scalar::Int64(12500)));
        assert_eq!(ScalarType::Int64.coerce("-3"), Some(Scalar::Int64(-3)));
        assert_eq!(ScalarType::Int64.coerce("1,000"), None);
        assert_eq!(ScalarType::Int64.coerce("2.5"), None);
        assert_eq!(
            ScalarType::Float64.coerce("12.75"),
            Some(Scalar::Float64(12.75))
        );
        assert_eq!(ScalarType::Float64.coerce("3,14"), None);
    }

    #[test]
    fn string_coercion_keeps_literal() {
        assert_eq!(
            ScalarType::String.coerce("a:b"),
            Some(Scalar::String("a:b".to_string()))
        );
    }

    #[test]
    fn defaults_follow_kind() {
        assert_eq!(ScalarType::Bool.default_value(), Scalar::Bool(true));
        assert_eq!(ScalarType::String.default_value(), Scalar::String(String::new()));
        assert_eq!(ScalarType::Int64.default_value(), Scalar::Int64(0));
        assert_eq!(ScalarType::Float64.default_value(), Scalar::Float64(0.0));
    }

    #[test]
    fn type_names_round_trip_through_from_str() {
        for kind in [
            ScalarType::Bool,
            ScalarType::String,
            ScalarType::Int64,
            ScalarType::Float64,
        ] {
            assert_eq!(kind.name().parse::<ScalarType>(), Ok(kind));
        }
        assert!("int".parse::<ScalarType>().is_err());
    }

    #[test]
    fn scalar_json_is_untagged() {
        let parsed: Vec<Scalar> = serde_json::from_str(r#"[null, true, 5, 5.5, "x"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                Scalar::Null,
                Scalar::Bool(true),
                Scalar::Int64(5),
                Scalar::Float64(5.5),
                Scalar::String("x".to_string()),
            ]
        );
        assert_eq!(serde_json::to_string(&Scalar::Null).unwrap(), "null");
    }

    #[test]
    fn option_converts_to_null() {
        assert_eq!(Scalar::from(None::<i64>), Scalar::Null);
        assert_eq!(Scalar::from(Some("x")), Scalar::String("x".to_string()));
    }
}
