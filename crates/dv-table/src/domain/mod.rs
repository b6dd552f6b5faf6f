//! Domain calculators
//!
//! Every calculator walks an index list through a value accessor
//! `(row index) -> Value` and returns the statistical domain a visual scale
//! needs. They are pure: nothing on the table or field is touched.

mod filter_props;
mod histogram;

pub use filter_props::{numeric_step_size, timestamp_step_size, FilterProps, TimeFormat};
pub use histogram::{histogram, HistogramBin};

use ahash::RandomState;
use dv_core::{Value, ValueKey};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Lower bound substituted for a zero minimum in log domains
pub const LOG_DOMAIN_FLOOR: f64 = 1e-5;

/// Domain returned when no usable values exist
pub const DEFAULT_EXTENT: [f64; 2] = [0.0, 1.0];

/// A computed domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Domain {
    /// `[min, max]` of a continuous scale
    Extent([f64; 2]),
    /// Discrete values: sorted for quantile scales, distinct for ordinal ones
    Values(Vec<Value>),
}

impl Domain {
    pub fn as_extent(&self) -> Option<[f64; 2]> {
        match self {
            Domain::Extent(extent) => Some(*extent),
            Domain::Values(_) => None,
        }
    }

    pub fn as_values(&self) -> Option<&[Value]> {
        match self {
            Domain::Extent(_) => None,
            Domain::Values(values) => Some(values),
        }
    }
}

/// Scale types a layer can ask a domain for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    Ordinal,
    Point,
    Quantile,
    Quantize,
    Linear,
    Sqrt,
    Log,
    Identity,
    Threshold,
}

impl FromStr for ScaleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ordinal" => Ok(ScaleType::Ordinal),
            "point" => Ok(ScaleType::Point),
            "quantile" => Ok(ScaleType::Quantile),
            "quantize" => Ok(ScaleType::Quantize),
            "linear" => Ok(ScaleType::Linear),
            "sqrt" => Ok(ScaleType::Sqrt),
            "log" => Ok(ScaleType::Log),
            "identity" => Ok(ScaleType::Identity),
            "threshold" => Ok(ScaleType::Threshold),
            other => Err(format!("scale type {} not supported", other)),
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScaleType::Ordinal => "ordinal",
            ScaleType::Point => "point",
            ScaleType::Quantile => "quantile",
            ScaleType::Quantize => "quantize",
            ScaleType::Linear => "linear",
            ScaleType::Sqrt => "sqrt",
            ScaleType::Log => "log",
            ScaleType::Identity => "identity",
            ScaleType::Threshold => "threshold",
        };
        f.write_str(name)
    }
}

fn extent<I>(values: I) -> Option<[f64; 2]>
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some([v, v]),
        Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
    })
}

/// `[min, max]` over the numeric values, ignoring missing ones.
/// Used by linear, sqrt and quantize scales.
pub fn linear_domain<F>(indices: &[usize], value: F) -> [f64; 2]
where
    F: Fn(usize) -> Value,
{
    extent(indices.iter().filter_map(|&i| value(i).as_f64())).unwrap_or(DEFAULT_EXTENT)
}

/// Linear domain made safe for a log scale.
///
/// A non-positive minimum is floored to [`LOG_DOMAIN_FLOOR`]; when no value is
/// positive the result is `[LOG_DOMAIN_FLOOR, 1]`.
pub fn log_domain<F>(indices: &[usize], value: F) -> [f64; 2]
where
    F: Fn(usize) -> Value,
{
    let Some([lo, hi]) = extent(indices.iter().filter_map(|&i| value(i).as_f64())) else {
        return [LOG_DOMAIN_FLOOR, 1.0];
    };
    if hi <= 0.0 {
        return [LOG_DOMAIN_FLOOR, 1.0];
    }
    [if lo <= 0.0 { LOG_DOMAIN_FLOOR } else { lo }, hi]
}

/// All present values, stably sorted with `compare`
pub fn quantile_domain<F, C>(indices: &[usize], value: F, compare: C) -> Vec<Value>
where
    F: Fn(usize) -> Value,
    C: Fn(&Value, &Value) -> Ordering,
{
    let mut values: Vec<Value> = indices
        .iter()
        .map(|&i| value(i))
        .filter(|v| !v.is_missing())
        .collect();
    values.sort_by(|a, b| compare(a, b));
    values
}

/// Distinct present values in first-occurrence order
pub fn ordinal_domain<F>(indices: &[usize], value: F) -> Vec<Value>
where
    F: Fn(usize) -> Value,
{
    let mut seen: IndexSet<ValueKey, RandomState> = IndexSet::default();
    let mut values = Vec::new();
    for &i in indices {
        let v = value(i);
        if v.is_missing() {
            continue;
        }
        if seen.insert(v.key()) {
            values.push(v);
        }
    }
    values
}

pub fn boolean_domain() -> Vec<Value> {
    vec![Value::Bool(true), Value::Bool(false)]
}

/// `[min, max]` of epoch-millisecond values; non-finite values are skipped
pub fn timestamp_domain<F>(indices: &[usize], value: F) -> [f64; 2]
where
    F: Fn(usize) -> Value,
{
    extent(
        indices
            .iter()
            .filter_map(|&i| value(i).as_f64())
            .filter(|v| v.is_finite()),
    )
    .unwrap_or(DEFAULT_EXTENT)
}
