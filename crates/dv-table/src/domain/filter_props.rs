//! Per-field filter configuration derived from the full row set

use dv_core::{FieldType, FilterType, Value};
use serde::{Deserialize, Serialize};

use super::{
    boolean_domain, histogram, linear_domain, ordinal_domain, timestamp_domain, Domain,
    HistogramBin, DEFAULT_EXTENT,
};
use crate::config::TableConfig;
use crate::field::Field;

const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;
const YEAR_MS: f64 = 365.0 * DAY_MS;

/// `(max span, step)` for timestamp sliders, first match wins
const TIMESTAMP_STEPS: &[(f64, f64)] = &[
    (1.0, 0.05),
    (10.0, 0.1),
    (100.0, 1.0),
    (500.0, 5.0),
    (1000.0, 10.0),
    (5000.0, 50.0),
    (f64::INFINITY, 1000.0),
];

/// Label precision for a time filter, chosen from the span of its domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    Date,
    DateMinute,
    DateSecond,
}

impl TimeFormat {
    pub fn for_span(span_ms: f64) -> Self {
        if span_ms > YEAR_MS {
            TimeFormat::Date
        } else if span_ms > DAY_MS {
            TimeFormat::DateMinute
        } else {
            TimeFormat::DateSecond
        }
    }

    /// strftime pattern
    pub fn pattern(&self) -> &'static str {
        match self {
            TimeFormat::Date => "%Y-%m-%d",
            TimeFormat::DateMinute => "%Y-%m-%d %H:%M",
            TimeFormat::DateSecond => "%Y-%m-%d %H:%M:%S",
        }
    }
}

/// Slider step for a numeric range of width `diff`
pub fn numeric_step_size(diff: f64) -> f64 {
    let diff = diff.abs();
    if !diff.is_finite() || diff == 0.0 {
        return 0.1;
    }
    if diff > 100.0 {
        1.0
    } else if diff > 3.0 {
        0.01
    } else if diff > 1.0 {
        0.001
    } else {
        // at least 1000 steps across the range
        10f64.powi((diff / 1000.0).log10().floor() as i32)
    }
}

/// Slider step for a timestamp range of width `diff` milliseconds
pub fn timestamp_step_size(diff: f64) -> f64 {
    TIMESTAMP_STEPS
        .iter()
        .find(|(max, _)| *max >= diff)
        .map(|(_, step)| *step)
        .unwrap_or(1000.0)
}

fn round_to_step(value: f64, step: f64, floor: bool) -> f64 {
    let inverse = 1.0 / step;
    if floor {
        (value * inverse).floor() / inverse
    } else {
        (value * inverse).ceil() / inverse
    }
}

/// Filter configuration of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterProps {
    pub domain: Domain,
    pub step: Option<f64>,
    pub histogram: Vec<HistogramBin>,
    pub enlarged_histogram: Vec<HistogramBin>,
    /// Filter type the UI should offer for the field
    pub filter_type: FilterType,
    /// Whether filters on this field may run on the device
    pub gpu: bool,
    pub fixed_domain: bool,
    pub time_format: Option<TimeFormat>,
}

impl FilterProps {
    fn discrete(domain: Vec<Value>, filter_type: FilterType) -> Self {
        Self {
            domain: Domain::Values(domain),
            step: None,
            histogram: Vec::new(),
            enlarged_histogram: Vec::new(),
            filter_type,
            gpu: false,
            fixed_domain: false,
            time_format: None,
        }
    }

    /// Compute the props of `field` over the rows in `indices`
    pub fn compute<F>(field: &Field, indices: &[usize], value: F, config: &TableConfig) -> Self
    where
        F: Fn(usize) -> Value,
    {
        match field.field_type {
            FieldType::Real | FieldType::Integer => {
                let mut domain = if indices.len() > 1 {
                    linear_domain(indices, &value)
                } else {
                    DEFAULT_EXTENT
                };
                // equal bounds would break quantize scales
                if domain[1] - domain[0] == 0.0 {
                    domain[1] = domain[0] + 1.0;
                }
                let step = numeric_step_size(domain[1] - domain[0]);
                let domain = [
                    round_to_step(domain[0], step, true),
                    round_to_step(domain[1], step, false),
                ];
                let values: Vec<f64> = indices.iter().filter_map(|&i| value(i).as_f64()).collect();

                Self {
                    domain: Domain::Extent(domain),
                    step: Some(step),
                    histogram: histogram(&values, domain, config.histogram_bins),
                    enlarged_histogram: histogram(&values, domain, config.enlarged_histogram_bins),
                    filter_type: FilterType::Range,
                    gpu: true,
                    fixed_domain: false,
                    time_format: None,
                }
            }
            FieldType::Timestamp => {
                let domain = timestamp_domain(indices, &value);
                let span = domain[1] - domain[0];
                let values: Vec<f64> = indices
                    .iter()
                    .filter_map(|&i| value(i).as_f64())
                    .filter(|v| v.is_finite())
                    .collect();

                Self {
                    domain: Domain::Extent(domain),
                    step: Some(timestamp_step_size(span)),
                    histogram: histogram(&values, domain, config.histogram_bins),
                    enlarged_histogram: histogram(&values, domain, config.enlarged_histogram_bins),
                    filter_type: FilterType::TimeRange,
                    gpu: true,
                    fixed_domain: true,
                    time_format: Some(TimeFormat::for_span(span)),
                }
            }
            FieldType::Boolean => Self::discrete(boolean_domain(), FilterType::Select),
            FieldType::String
            | FieldType::Date
            | FieldType::GeoJson
            | FieldType::Array
            | FieldType::Object => {
                Self::discrete(ordinal_domain(indices, &value), FilterType::MultiSelect)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSpec;

    #[test]
    fn test_numeric_step_size() {
        assert_eq!(numeric_step_size(500.0), 1.0);
        assert_eq!(numeric_step_size(50.0), 0.01);
        assert_eq!(numeric_step_size(2.0), 0.001);
        assert!((numeric_step_size(0.5) - 0.0001).abs() < 1e-12);
        assert_eq!(numeric_step_size(0.0), 0.1);
    }

    #[test]
    fn test_timestamp_step_size() {
        assert_eq!(timestamp_step_size(0.5), 0.05);
        assert_eq!(timestamp_step_size(250.0), 5.0);
        assert_eq!(timestamp_step_size(1e9), 1000.0);
    }

    #[test]
    fn test_time_format_by_span() {
        assert_eq!(TimeFormat::for_span(2.0 * YEAR_MS), TimeFormat::Date);
        assert_eq!(TimeFormat::for_span(3.0 * DAY_MS), TimeFormat::DateMinute);
        assert_eq!(TimeFormat::for_span(1000.0), TimeFormat::DateSecond);
    }

    #[test]
    fn test_numeric_props() {
        let field = Field::new(FieldSpec::new("speed", FieldType::Real), 0);
        let values = [1.25, 7.5, 3.0, 180.4];
        let props = FilterProps::compute(&field, &[0, 1, 2, 3], |i| Value::Real(values[i]), &TableConfig::default());

        assert_eq!(props.domain, Domain::Extent([1.0, 181.0]));
        assert_eq!(props.step, Some(1.0));
        assert_eq!(props.filter_type, FilterType::Range);
        assert!(props.gpu);
        assert_eq!(props.histogram.len(), 30);
        assert_eq!(props.enlarged_histogram.len(), 100);
        assert_eq!(props.histogram.iter().map(|b| b.count).sum::<usize>(), 4);
    }

    #[test]
    fn test_degenerate_numeric_domain_is_widened() {
        let field = Field::new(FieldSpec::new("n", FieldType::Integer), 0);
        let props = FilterProps::compute(&field, &[0, 1], |_| Value::Int(96), &TableConfig::default());
        assert_eq!(props.domain, Domain::Extent([96.0, 97.0]));
    }

    #[test]
    fn test_string_and_boolean_props() {
        let field = Field::new(FieldSpec::new("city", FieldType::String), 0);
        let cities = ["sf", "la", "sf"];
        let props = FilterProps::compute(&field, &[0, 1, 2], |i| Value::from(cities[i]), &TableConfig::default());
        assert_eq!(props.domain, Domain::Values(vec!["sf".into(), "la".into()]));
        assert_eq!(props.filter_type, FilterType::MultiSelect);
        assert!(!props.gpu);

        let field = Field::new(FieldSpec::new("ok", FieldType::Boolean), 0);
        let props = FilterProps::compute(&field, &[0], |_| Value::Bool(true), &TableConfig::default());
        assert_eq!(props.domain, Domain::Values(boolean_domain()));
        assert_eq!(props.filter_type, FilterType::Select);
    }

    #[test]
    fn test_timestamp_props() {
        let field = Field::new(FieldSpec::new("t", FieldType::Timestamp).with_format("x"), 0);
        let times = [0.0, 2.0 * DAY_MS];
        let props = FilterProps::compute(&field, &[0, 1], |i| Value::Real(times[i]), &TableConfig::default());
        assert_eq!(props.domain, Domain::Extent([0.0, 2.0 * DAY_MS]));
        assert_eq!(props.filter_type, FilterType::TimeRange);
        assert!(props.fixed_domain);
        assert_eq!(props.step, Some(1000.0));
        assert_eq!(props.time_format, Some(TimeFormat::DateMinute));
    }
}
