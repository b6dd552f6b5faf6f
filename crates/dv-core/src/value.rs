//! Cell values and field types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A row is an ordered list of raw cells, one per field
pub type Row = Vec<Value>;

/// A single raw or typed cell value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
}

impl Value {
    /// Missing cells are nulls and NaN reals
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Real(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Real(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Hashable identity used for distinct sets and membership tests
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Int(v) => ValueKey::number(*v as f64),
            Value::Real(v) if v.is_nan() => ValueKey::Null,
            Value::Real(v) => ValueKey::number(*v),
            Value::Str(s) => ValueKey::Str(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Hash/Eq identity of a [`Value`]. Integers and reals that are numerically
/// equal share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Bool(bool),
    Number(u64),
    Str(String),
}

impl ValueKey {
    fn number(v: f64) -> Self {
        // -0.0 and 0.0 must collide
        let v = if v == 0.0 { 0.0 } else { v };
        ValueKey::Number(v.to_bits())
    }
}

/// Column types understood by the table model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Real,
    Integer,
    Boolean,
    String,
    Date,
    Timestamp,
    GeoJson,
    Array,
    Object,
}

impl FieldType {
    /// Whether values of this type compare numerically
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Real | FieldType::Integer | FieldType::Timestamp)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Real => "real",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::String => "string",
            FieldType::Date => "date",
            FieldType::Timestamp => "timestamp",
            FieldType::GeoJson => "geojson",
            FieldType::Array => "array",
            FieldType::Object => "object",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_from_json_rows() {
        let row: Row = serde_json::from_str(r#"[null, true, 3, 2.5, "abc"]"#).unwrap();
        assert_eq!(
            row,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Int(3),
                Value::Real(2.5),
                Value::Str("abc".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_values() {
        assert!(Value::Null.is_missing());
        assert!(Value::Real(f64::NAN).is_missing());
        assert!(!Value::Int(0).is_missing());
        assert!(!Value::Str(String::new()).is_missing());
    }

    #[test]
    fn test_numeric_keys_collide() {
        assert_eq!(Value::Int(1).key(), Value::Real(1.0).key());
        assert_eq!(Value::Real(-0.0).key(), Value::Real(0.0).key());
        assert_ne!(Value::Int(1).key(), Value::Str("1".into()).key());
    }

    #[test]
    fn test_field_type_names() {
        let t: FieldType = serde_json::from_str(r#""timestamp""#).unwrap();
        assert_eq!(t, FieldType::Timestamp);
        let t: FieldType = serde_json::from_str(r#""geojson""#).unwrap();
        assert_eq!(t, FieldType::GeoJson);
        assert_eq!(FieldType::Integer.to_string(), "integer");
    }
}
