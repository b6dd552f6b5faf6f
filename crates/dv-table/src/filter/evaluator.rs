//! Builds row predicates from filter descriptors

use ahash::AHashSet;
use dv_core::{FilterDescriptor, FilterType, FilterValue, LayerInfo, Value, ValueKey};
use geo::{Contains, LineString, Point, Polygon};
use std::fmt;

use crate::field::Field;

/// A compiled filter test over one row
pub enum Predicate<'a> {
    /// The filter does not apply to this table and lets every row through
    Inapplicable,
    Test(Box<dyn Fn(&[Value]) -> bool + 'a>),
}

impl Predicate<'_> {
    pub fn matches(&self, row: &[Value]) -> bool {
        match self {
            Predicate::Inapplicable => true,
            Predicate::Test(test) => test(row),
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Predicate::Test(_))
    }
}

impl fmt::Debug for Predicate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Inapplicable => f.write_str("Predicate::Inapplicable"),
            Predicate::Test(_) => f.write_str("Predicate::Test(..)"),
        }
    }
}

fn inapplicable<'a>(table_id: &str, filter: &FilterDescriptor, reason: &str) -> Predicate<'a> {
    tracing::debug!(
        "Filter '{}' does not apply to table '{}': {}",
        filter.id,
        table_id,
        reason
    );
    Predicate::Inapplicable
}

/// Build the predicate of `filter` for one table.
///
/// `field` is the filter's target field in this table, already resolved.
/// Polygon filters ignore it and read the position columns of the layers
/// they reference instead, looked up in `fields`.
pub fn build_predicate<'a>(
    field: Option<&'a Field>,
    table_id: &str,
    filter: &'a FilterDescriptor,
    layers: &[LayerInfo],
    fields: &'a [Field],
) -> Predicate<'a> {
    let include_missing = filter.include_missing;

    if filter.filter_type == FilterType::Polygon {
        return polygon_predicate(table_id, filter, layers, fields);
    }

    let Some(field) = field else {
        tracing::warn!(
            "Filter '{}' targets no field of table '{}', ignoring it",
            filter.id,
            table_id
        );
        return Predicate::Inapplicable;
    };

    match (filter.filter_type, &filter.value) {
        (FilterType::Range | FilterType::TimeRange, FilterValue::Range([lo, hi])) => {
            let (lo, hi) = (*lo, *hi);
            Predicate::Test(Box::new(move |row: &[Value]| {
                let value = field.value(row);
                if value.is_missing() {
                    return include_missing;
                }
                value.as_f64().map_or(false, |v| v >= lo && v <= hi)
            }))
        }
        (FilterType::Select, FilterValue::Bool(expected)) => {
            let expected = *expected;
            Predicate::Test(Box::new(move |row: &[Value]| {
                let value = field.value(row);
                if value.is_missing() {
                    return include_missing;
                }
                value.as_bool() == Some(expected)
            }))
        }
        (FilterType::MultiSelect, FilterValue::Set(values)) => {
            let accepted: AHashSet<ValueKey> = values.iter().map(Value::key).collect();
            Predicate::Test(Box::new(move |row: &[Value]| {
                let value = field.value(row);
                if value.is_missing() {
                    return include_missing;
                }
                accepted.contains(&value.key())
            }))
        }
        (FilterType::Input, FilterValue::Text(text)) => {
            let needle = text.to_lowercase();
            Predicate::Test(Box::new(move |row: &[Value]| {
                let value = field.value(row);
                if value.is_missing() {
                    return include_missing;
                }
                value.to_string().to_lowercase().contains(&needle)
            }))
        }
        _ => inapplicable(table_id, filter, "value does not match filter type"),
    }
}

fn polygon_predicate<'a>(
    table_id: &str,
    filter: &'a FilterDescriptor,
    layers: &[LayerInfo],
    fields: &'a [Field],
) -> Predicate<'a> {
    let FilterValue::Polygon(ring) = &filter.value else {
        return inapplicable(table_id, filter, "polygon filter without a polygon");
    };

    // (lat field, lng field) of every referenced point layer drawing this table
    let positions: Vec<(&'a Field, &'a Field)> = filter
        .layer_id
        .iter()
        .filter_map(|id| layers.iter().find(|layer| &layer.id == id))
        .filter(|layer| layer.data_id == table_id)
        .filter_map(|layer| {
            let position = layer.position.as_ref()?;
            let lat = fields.iter().find(|f| f.name == position.lat)?;
            let lng = fields.iter().find(|f| f.name == position.lng)?;
            Some((lat, lng))
        })
        .collect();

    if positions.is_empty() {
        return inapplicable(table_id, filter, "no point layer of this table is referenced");
    }

    let exterior: Vec<(f64, f64)> = ring.iter().map(|&[x, y]| (x, y)).collect();
    let polygon = Polygon::new(LineString::from(exterior), Vec::new());
    let include_missing = filter.include_missing;

    Predicate::Test(Box::new(move |row: &[Value]| {
        positions.iter().all(|(lat, lng)| {
            match (lat.value(row).as_f64(), lng.value(row).as_f64()) {
                (Some(lat), Some(lng)) => polygon.contains(&Point::new(lng, lat)),
                _ => include_missing,
            }
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSpec;
    use dv_core::FieldType;

    fn fields() -> Vec<Field> {
        vec![
            Field::new(FieldSpec::new("speed", FieldType::Real), 0),
            Field::new(FieldSpec::new("city", FieldType::String), 1),
            Field::new(FieldSpec::new("ok", FieldType::Boolean), 2),
            Field::new(FieldSpec::new("lat", FieldType::Real), 3),
            Field::new(FieldSpec::new("lng", FieldType::Real), 4),
        ]
    }

    fn row(speed: Value, city: &str, ok: bool, lat: f64, lng: f64) -> Vec<Value> {
        vec![speed, city.into(), ok.into(), lat.into(), lng.into()]
    }

    #[test]
    fn test_range_predicate() {
        let fields = fields();
        let filter = FilterDescriptor::new("f", FilterType::Range, FilterValue::Range([1.0, 5.0]));
        let predicate = build_predicate(Some(&fields[0]), "t", &filter, &[], &fields);

        assert!(predicate.matches(&row(Value::Real(1.0), "a", true, 0.0, 0.0)));
        assert!(predicate.matches(&row(Value::Real(5.0), "a", true, 0.0, 0.0)));
        assert!(!predicate.matches(&row(Value::Real(5.1), "a", true, 0.0, 0.0)));
        assert!(!predicate.matches(&row(Value::Null, "a", true, 0.0, 0.0)));
    }

    #[test]
    fn test_include_missing() {
        let fields = fields();
        let filter = FilterDescriptor::new("f", FilterType::Range, FilterValue::Range([1.0, 5.0])).including_missing();
        let predicate = build_predicate(Some(&fields[0]), "t", &filter, &[], &fields);
        assert!(predicate.matches(&row(Value::Null, "a", true, 0.0, 0.0)));
    }

    #[test]
    fn test_multi_select_and_select() {
        let fields = fields();
        let filter = FilterDescriptor::new(
            "f",
            FilterType::MultiSelect,
            FilterValue::Set(vec!["sf".into(), "la".into()]),
        );
        let predicate = build_predicate(Some(&fields[1]), "t", &filter, &[], &fields);
        assert!(predicate.matches(&row(Value::Null, "la", true, 0.0, 0.0)));
        assert!(!predicate.matches(&row(Value::Null, "ny", true, 0.0, 0.0)));

        let filter = FilterDescriptor::new("g", FilterType::Select, FilterValue::Bool(false));
        let predicate = build_predicate(Some(&fields[2]), "t", &filter, &[], &fields);
        assert!(predicate.matches(&row(Value::Null, "la", false, 0.0, 0.0)));
        assert!(!predicate.matches(&row(Value::Null, "la", true, 0.0, 0.0)));
    }

    #[test]
    fn test_input_predicate() {
        let fields = fields();
        let filter = FilterDescriptor::new("f", FilterType::Input, FilterValue::Text("AN".into()));
        let predicate = build_predicate(Some(&fields[1]), "t", &filter, &[], &fields);
        assert!(predicate.matches(&row(Value::Null, "san jose", true, 0.0, 0.0)));
        assert!(predicate.matches(&row(Value::Null, "oakland", true, 0.0, 0.0)));
        assert!(!predicate.matches(&row(Value::Null, "reno", true, 0.0, 0.0)));
    }

    #[test]
    fn test_missing_field_is_inapplicable() {
        let fields = fields();
        let filter = FilterDescriptor::new("f", FilterType::Range, FilterValue::Range([1.0, 5.0]));
        let predicate = build_predicate(None, "t", &filter, &[], &fields);
        assert!(!predicate.is_applicable());
        assert!(predicate.matches(&row(Value::Real(100.0), "a", true, 0.0, 0.0)));
    }

    #[test]
    fn test_polygon_predicate() {
        let fields = fields();
        let layers = vec![
            LayerInfo::new("points", "t").with_position("lat", "lng"),
            LayerInfo::new("other", "elsewhere").with_position("lat", "lng"),
        ];
        let filter = FilterDescriptor::new(
            "p",
            FilterType::Polygon,
            FilterValue::Polygon(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]),
        )
        .with_layers(["points", "other"]);

        let predicate = build_predicate(None, "t", &filter, &layers, &fields);
        assert!(predicate.is_applicable());
        assert!(predicate.matches(&row(Value::Null, "a", true, 5.0, 5.0)));
        assert!(!predicate.matches(&row(Value::Null, "a", true, 5.0, 15.0)));

        let no_layers = build_predicate(None, "t", &filter, &[], &fields);
        assert!(!no_layers.is_applicable());
    }
}
