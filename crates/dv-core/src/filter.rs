//! Filter descriptors
//!
//! A filter descriptor is built by the UI and consumed read-only by every
//! table it names. One descriptor may target several tables, each through a
//! field at a different position, so `data_id`, `name` and `field_idx` are
//! parallel lists.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Kinds of filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    /// Inclusive numeric range
    Range,
    /// Inclusive range over timestamps (epoch milliseconds)
    TimeRange,
    /// Boolean equality
    Select,
    /// Set membership
    MultiSelect,
    /// Case-insensitive substring match
    Input,
    /// Point-in-polygon over a layer's position columns
    Polygon,
}

/// The value a filter tests against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterValue {
    Range([f64; 2]),
    Bool(bool),
    Set(Vec<Value>),
    Text(String),
    /// Polygon ring as `[lng, lat]` vertices
    Polygon(Vec<[f64; 2]>),
}

/// A filter as configured by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDescriptor {
    pub id: String,

    /// Tables this filter applies to
    #[serde(default)]
    pub data_id: Vec<String>,

    /// Target field name, per table
    #[serde(default)]
    pub name: Vec<String>,

    /// Target field index, per table
    #[serde(default)]
    pub field_idx: Vec<Option<usize>>,

    #[serde(rename = "type")]
    pub filter_type: FilterType,

    pub value: FilterValue,

    /// Whether the filter can be evaluated on the device
    #[serde(default)]
    pub gpu: bool,

    /// Fixed-domain filters never drive domain recomputation
    #[serde(default)]
    pub fixed_domain: bool,

    /// Let missing cells pass the filter
    #[serde(default)]
    pub include_missing: bool,

    /// Layers a polygon filter applies to
    #[serde(default)]
    pub layer_id: Vec<String>,

    /// Full value domain of the target field, when known
    #[serde(default)]
    pub domain: Option<[f64; 2]>,
}

impl FilterDescriptor {
    pub fn new(id: impl Into<String>, filter_type: FilterType, value: FilterValue) -> Self {
        Self {
            id: id.into(),
            data_id: Vec::new(),
            name: Vec::new(),
            field_idx: Vec::new(),
            filter_type,
            value,
            gpu: false,
            fixed_domain: false,
            include_missing: false,
            layer_id: Vec::new(),
            domain: None,
        }
    }

    /// Target a field of one more table
    pub fn for_table(mut self, data_id: impl Into<String>, name: impl Into<String>, field_idx: Option<usize>) -> Self {
        self.data_id.push(data_id.into());
        self.name.push(name.into());
        self.field_idx.push(field_idx);
        self
    }

    pub fn with_gpu(mut self, gpu: bool) -> Self {
        self.gpu = gpu;
        self
    }

    pub fn with_fixed_domain(mut self, fixed_domain: bool) -> Self {
        self.fixed_domain = fixed_domain;
        self
    }

    pub fn with_domain(mut self, domain: [f64; 2]) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn with_layers<I, S>(mut self, layer_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layer_id = layer_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn including_missing(mut self) -> Self {
        self.include_missing = true;
        self
    }

    /// Whether this filter names the given table
    pub fn applies_to(&self, table_id: &str) -> bool {
        self.data_id.iter().any(|id| id == table_id)
    }

    /// Whether the value is usable for the filter type
    pub fn is_valid(&self) -> bool {
        match (self.filter_type, &self.value) {
            (FilterType::Range | FilterType::TimeRange, FilterValue::Range([lo, hi])) => {
                lo.is_finite() && hi.is_finite()
            }
            (FilterType::Select, FilterValue::Bool(_)) => true,
            (FilterType::MultiSelect, FilterValue::Set(values)) => !values.is_empty(),
            (FilterType::Input, FilterValue::Text(text)) => !text.is_empty(),
            (FilterType::Polygon, FilterValue::Polygon(ring)) => ring.len() >= 3,
            _ => false,
        }
    }
}

/// Resolves which field of a table a filter targets
pub trait FieldIndexResolver: Send + Sync + std::fmt::Debug {
    fn resolve(&self, table_id: &str, filter: &FilterDescriptor) -> Option<usize>;
}

/// Looks the table up in `data_id` and reads the parallel `field_idx` slot
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetFieldResolver;

impl FieldIndexResolver for DatasetFieldResolver {
    fn resolve(&self, table_id: &str, filter: &FilterDescriptor) -> Option<usize> {
        let position = filter.data_id.iter().position(|id| id == table_id)?;
        filter.field_idx.get(position).copied().flatten()
    }
}
