//! Field metadata and typed value access

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use dv_core::{ascending, FieldType, Value};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::cmp::Ordering;

use crate::domain::FilterProps;

/// Field as described in construction input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub format: String,

    /// Any additional attributes, kept on the field untouched
    #[serde(flatten)]
    pub extensions: Map<String, serde_json::Value>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            format: String::new(),
            extensions: Map::new(),
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

/// Reads a typed value out of a raw cell. Chosen once per field from its type.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueAccessor {
    /// Floating point, numeric strings are parsed
    Real,
    /// Integers, numeric strings are parsed
    Integer,
    /// Booleans, also from `"true"`/`"false"`/`"1"`/`"0"`
    Boolean,
    /// Epoch milliseconds. `x` is numeric millis, `X` numeric seconds,
    /// anything else a strftime pattern; empty tries common layouts.
    Timestamp { format: String },
    /// The raw cell, unchanged
    Raw,
}

impl ValueAccessor {
    pub fn for_field(field_type: FieldType, format: &str) -> Self {
        match field_type {
            FieldType::Real => ValueAccessor::Real,
            FieldType::Integer => ValueAccessor::Integer,
            FieldType::Boolean => ValueAccessor::Boolean,
            FieldType::Timestamp => ValueAccessor::Timestamp {
                format: format.to_string(),
            },
            FieldType::String
            | FieldType::Date
            | FieldType::GeoJson
            | FieldType::Array
            | FieldType::Object => ValueAccessor::Raw,
        }
    }

    /// Typed value of a raw cell; unreadable cells come back as `Null`
    pub fn read(&self, cell: &Value) -> Value {
        match self {
            ValueAccessor::Raw => cell.clone(),
            ValueAccessor::Real => match cell {
                Value::Int(v) => Value::Real(*v as f64),
                Value::Real(v) if !v.is_nan() => Value::Real(*v),
                Value::Str(s) => s.trim().parse::<f64>().map(Value::Real).unwrap_or(Value::Null),
                _ => Value::Null,
            },
            ValueAccessor::Integer => match cell {
                Value::Int(v) => Value::Int(*v),
                Value::Real(v) if !v.is_nan() => Value::Real(*v),
                Value::Str(s) => {
                    let s = s.trim();
                    s.parse::<i64>()
                        .map(Value::Int)
                        .or_else(|_| s.parse::<f64>().map(Value::Real))
                        .unwrap_or(Value::Null)
                }
                _ => Value::Null,
            },
            ValueAccessor::Boolean => match cell {
                Value::Bool(b) => Value::Bool(*b),
                Value::Int(0) => Value::Bool(false),
                Value::Int(1) => Value::Bool(true),
                Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Value::Bool(true),
                    "false" | "0" => Value::Bool(false),
                    _ => Value::Null,
                },
                _ => Value::Null,
            },
            ValueAccessor::Timestamp { format } => parse_timestamp(cell, format)
                .map(Value::Real)
                .unwrap_or(Value::Null),
        }
    }
}

fn parse_timestamp(cell: &Value, format: &str) -> Option<f64> {
    let seconds = format == "X";
    let millis = match cell {
        Value::Int(v) => *v as f64,
        Value::Real(v) if v.is_finite() => *v,
        Value::Str(s) => return parse_timestamp_str(s.trim(), format),
        _ => return None,
    };
    Some(if seconds { millis * 1000.0 } else { millis })
}

const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

fn parse_timestamp_str(s: &str, format: &str) -> Option<f64> {
    match format {
        "x" => s.parse::<f64>().ok().filter(|v| v.is_finite()),
        "X" => s.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v * 1000.0),
        "" => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.timestamp_millis() as f64);
            }
            DATETIME_LAYOUTS
                .iter()
                .find_map(|layout| parse_with(s, layout))
                .or_else(|| DATE_LAYOUTS.iter().find_map(|layout| parse_with(s, layout)))
                .or_else(|| s.parse::<f64>().ok().filter(|v| v.is_finite()))
        }
        layout => parse_with(s, layout),
    }
}

fn parse_with(s: &str, layout: &str) -> Option<f64> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, layout) {
        return Some(dt.and_utc().timestamp_millis() as f64);
    }
    let date = NaiveDate::parse_from_str(s, layout).ok()?;
    let dt = date.and_hms_opt(0, 0, 0)?;
    Some(dt.and_utc().timestamp_millis() as f64)
}

/// One column of a table
#[derive(Debug, Clone)]
pub struct Field {
    /// Unique within the table
    pub name: String,

    /// Human-readable name, defaults to `name`
    pub display_name: String,

    pub field_type: FieldType,

    /// Parse/display format, relevant for timestamps
    pub format: String,

    /// Position of the field's cell in every row
    pub index: usize,

    pub accessor: ValueAccessor,

    /// Extra attributes carried through from the construction input
    pub extensions: Map<String, serde_json::Value>,

    filter_props: OnceCell<FilterProps>,
}

impl Field {
    pub fn new(spec: FieldSpec, index: usize) -> Self {
        let accessor = ValueAccessor::for_field(spec.field_type, &spec.format);
        Self {
            display_name: spec.name.clone(),
            name: spec.name,
            field_type: spec.field_type,
            format: spec.format,
            index,
            accessor,
            extensions: spec.extensions,
            filter_props: OnceCell::new(),
        }
    }

    /// Typed value of this field in a row
    pub fn value(&self, row: &[Value]) -> Value {
        row.get(self.index)
            .map(|cell| self.accessor.read(cell))
            .unwrap_or(Value::Null)
    }

    /// Order two typed values of this field, missing values last.
    ///
    /// Dates compare chronologically when they parse with the field's format;
    /// unparseable dates follow the parsed ones in string order.
    pub fn compare_values(&self, a: &Value, b: &Value) -> Ordering {
        if self.field_type != FieldType::Date {
            return ascending(a, b);
        }
        match (self.date_millis(a), self.date_millis(b)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => ascending(a, b),
        }
    }

    fn date_millis(&self, value: &Value) -> Option<f64> {
        value
            .as_str()
            .and_then(|s| parse_timestamp_str(s.trim(), &self.format))
    }

    /// Cached filter props, if they have been computed
    pub fn filter_props(&self) -> Option<&FilterProps> {
        self.filter_props.get()
    }

    pub(crate) fn filter_props_or_init<F>(&self, init: F) -> &FilterProps
    where
        F: FnOnce() -> FilterProps,
    {
        self.filter_props.get_or_init(init)
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.field_type == other.field_type
            && self.format == other.format
            && self.index == other.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_dates_chronologically() {
        let field = Field::new(FieldSpec::new("day", FieldType::Date).with_format("%m/%d/%Y"), 0);
        let mut values: Vec<Value> = vec!["12/01/2019".into(), "bogus".into(), "01/15/2020".into(), "06/30/2019".into()];
        values.sort_by(|a, b| field.compare_values(a, b));
        assert_eq!(
            values,
            vec![
                Value::from("06/30/2019"),
                Value::from("12/01/2019"),
                Value::from("01/15/2020"),
                Value::from("bogus"),
            ]
        );

        let text = Field::new(FieldSpec::new("name", FieldType::String), 0);
        assert_eq!(text.compare_values(&"b".into(), &"a".into()), Ordering::Greater);
        assert_eq!(text.compare_values(&Value::Null, &"a".into()), Ordering::Greater);
    }

    #[test]
    fn test_accessor_from_type() {
        assert_eq!(ValueAccessor::for_field(FieldType::Real, ""), ValueAccessor::Real);
        assert_eq!(ValueAccessor::for_field(FieldType::Date, "%Y"), ValueAccessor::Raw);
        assert_eq!(
            ValueAccessor::for_field(FieldType::Timestamp, "X"),
            ValueAccessor::Timestamp { format: "X".to_string() }
        );
    }

    #[test]
    fn test_numeric_coercion() {
        let real = ValueAccessor::Real;
        assert_eq!(real.read(&Value::from("2.5")), Value::Real(2.5));
        assert_eq!(real.read(&Value::Int(3)), Value::Real(3.0));
        assert_eq!(real.read(&Value::from("abc")), Value::Null);

        let int = ValueAccessor::Integer;
        assert_eq!(int.read(&Value::from("7")), Value::Int(7));
        assert_eq!(int.read(&Value::Bool(true)), Value::Null);
    }

    #[test]
    fn test_boolean_coercion() {
        let accessor = ValueAccessor::Boolean;
        assert_eq!(accessor.read(&Value::from("TRUE")), Value::Bool(true));
        assert_eq!(accessor.read(&Value::Int(0)), Value::Bool(false));
        assert_eq!(accessor.read(&Value::from("maybe")), Value::Null);
    }

    #[test]
    fn test_timestamp_formats() {
        let seconds = ValueAccessor::Timestamp { format: "X".into() };
        assert_eq!(seconds.read(&Value::Int(10)), Value::Real(10_000.0));

        let millis = ValueAccessor::Timestamp { format: "x".into() };
        assert_eq!(millis.read(&Value::from("1500")), Value::Real(1500.0));

        let default = ValueAccessor::Timestamp { format: String::new() };
        assert_eq!(default.read(&Value::from("1970-01-01 00:00:01")), Value::Real(1000.0));
        assert_eq!(default.read(&Value::from("1970-01-02")), Value::Real(86_400_000.0));
        assert_eq!(default.read(&Value::from("1970-01-01T00:00:02Z")), Value::Real(2000.0));
        assert_eq!(default.read(&Value::from("not a date")), Value::Null);

        let custom = ValueAccessor::Timestamp { format: "%d/%m/%Y %H:%M".into() };
        assert_eq!(custom.read(&Value::from("01/01/1970 00:01")), Value::Real(60_000.0));
    }

    #[test]
    fn test_field_value_out_of_row() {
        let field = Field::new(FieldSpec::new("speed", FieldType::Real), 3);
        assert_eq!(field.value(&[Value::Int(1)]), Value::Null);
        assert_eq!(field.display_name, "speed");
        assert!(field.filter_props().is_none());
    }
}
