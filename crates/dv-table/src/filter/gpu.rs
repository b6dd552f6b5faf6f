//! Device-side filter parameters
//!
//! Gpu-flagged filters are not evaluated by the scan; the renderer receives a
//! fixed number of filter channels instead, each a value accessor plus an
//! inclusive range.

use dv_core::{DatasetFieldResolver, FieldIndexResolver, FilterDescriptor, FilterType, FilterValue, Value};
use std::fmt;
use std::sync::Arc;

use crate::field::Field;

/// Number of filter channels the device supports
pub const MAX_GPU_FILTERS: usize = 4;

/// Value fed to the device for a missing cell; falls outside every range
pub const GPU_MISSING_VALUE: f64 = f64::MIN;

/// One occupied device filter channel
#[derive(Debug, Clone, PartialEq)]
pub struct GpuChannel {
    pub filter_id: String,
    pub field_index: usize,
    /// Subtracted from values and range before upload, keeps timestamps in
    /// float32 precision
    pub offset: f64,
}

/// Filter parameters handed to the renderer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpuFilterState {
    /// Inclusive range per channel, offset applied; `[0, 0]` when unused
    pub filter_range: [[f64; 2]; MAX_GPU_FILTERS],
    pub channels: [Option<GpuChannel>; MAX_GPU_FILTERS],
}

impl GpuFilterState {
    /// Device values of one row, one per channel
    pub fn row_values(&self, fields: &[Field], row: &[Value]) -> [f64; MAX_GPU_FILTERS] {
        let mut values = [0.0; MAX_GPU_FILTERS];
        for (slot, channel) in self.channels.iter().enumerate() {
            let Some(channel) = channel else {
                continue;
            };
            values[slot] = fields
                .get(channel.field_index)
                .and_then(|field| field.value(row).as_f64())
                .map(|v| v - channel.offset)
                .unwrap_or(GPU_MISSING_VALUE);
        }
        values
    }

    /// `(channel, filter id)` pairs; a renderer re-uploads a channel when its
    /// trigger changes
    pub fn update_triggers(&self) -> Vec<(usize, &str)> {
        self.channels
            .iter()
            .enumerate()
            .filter_map(|(slot, channel)| channel.as_ref().map(|c| (slot, c.filter_id.as_str())))
            .collect()
    }

    /// Whether the filter with this id was given a channel
    pub fn has_channel(&self, filter_id: &str) -> bool {
        self.channels
            .iter()
            .flatten()
            .any(|channel| channel.filter_id == filter_id)
    }

    pub fn active_channels(&self) -> usize {
        self.channels.iter().filter(|c| c.is_some()).count()
    }
}

/// Derives device filter parameters from the active filters of a table
pub trait GpuFilterBuilder: Send + Sync + fmt::Debug {
    fn build(&self, filters: &[FilterDescriptor], table_id: &str, fields: &[Field]) -> GpuFilterState;
}

/// Assigns channels to valid gpu filters in order, dropping the overflow
#[derive(Debug, Clone)]
pub struct DefaultGpuFilterBuilder {
    resolver: Arc<dyn FieldIndexResolver>,
}

impl DefaultGpuFilterBuilder {
    pub fn new(resolver: Arc<dyn FieldIndexResolver>) -> Self {
        Self { resolver }
    }
}

impl Default for DefaultGpuFilterBuilder {
    fn default() -> Self {
        Self::new(Arc::new(DatasetFieldResolver))
    }
}

fn channel_offset(filter: &FilterDescriptor, field: &Field) -> f64 {
    if filter.filter_type != FilterType::TimeRange {
        return 0.0;
    }
    filter
        .domain
        .map(|[lo, _]| lo)
        .or_else(|| {
            field
                .filter_props()
                .and_then(|props| props.domain.as_extent())
                .map(|[lo, _]| lo)
        })
        .unwrap_or(0.0)
}

impl GpuFilterBuilder for DefaultGpuFilterBuilder {
    fn build(&self, filters: &[FilterDescriptor], table_id: &str, fields: &[Field]) -> GpuFilterState {
        let mut state = GpuFilterState::default();
        let mut slot = 0;

        for filter in filters
            .iter()
            .filter(|f| f.gpu && f.is_valid() && f.applies_to(table_id))
        {
            let FilterValue::Range([lo, hi]) = filter.value else {
                continue;
            };
            let Some(field) = self
                .resolver
                .resolve(table_id, filter)
                .and_then(|index| fields.get(index))
            else {
                continue;
            };
            if slot == MAX_GPU_FILTERS {
                tracing::warn!(
                    "Table '{}' has more than {} gpu filters, '{}' is evaluated on the CPU",
                    table_id,
                    MAX_GPU_FILTERS,
                    filter.id
                );
                continue;
            }

            let offset = channel_offset(filter, field);
            state.filter_range[slot] = [lo - offset, hi - offset];
            state.channels[slot] = Some(GpuChannel {
                filter_id: filter.id.clone(),
                field_index: field.index,
                offset,
            });
            slot += 1;
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSpec;
    use dv_core::FieldType;

    fn fields() -> Vec<Field> {
        vec![
            Field::new(FieldSpec::new("speed", FieldType::Real), 0),
            Field::new(FieldSpec::new("time", FieldType::Timestamp).with_format("x"), 1),
        ]
    }

    fn range(id: &str, field_idx: usize, lo: f64, hi: f64) -> FilterDescriptor {
        FilterDescriptor::new(id, FilterType::Range, FilterValue::Range([lo, hi]))
            .for_table("t", "speed", Some(field_idx))
            .with_gpu(true)
    }

    #[test]
    fn test_channels_assigned_in_order() {
        let fields = fields();
        let filters = vec![
            range("a", 0, 1.0, 2.0),
            range("cpu", 0, 0.0, 1.0).with_gpu(false),
            range("b", 0, 3.0, 4.0),
        ];
        let state = DefaultGpuFilterBuilder::default().build(&filters, "t", &fields);

        assert_eq!(state.active_channels(), 2);
        assert_eq!(state.filter_range[0], [1.0, 2.0]);
        assert_eq!(state.filter_range[1], [3.0, 4.0]);
        assert_eq!(state.filter_range[2], [0.0, 0.0]);
        assert_eq!(state.update_triggers(), vec![(0, "a"), (1, "b")]);
        assert!(state.has_channel("b"));
        assert!(!state.has_channel("cpu"));
    }

    #[test]
    fn test_overflow_is_dropped() {
        let fields = fields();
        let filters: Vec<_> = (0..6).map(|i| range(&format!("f{}", i), 0, 0.0, 1.0)).collect();
        let state = DefaultGpuFilterBuilder::default().build(&filters, "t", &fields);
        assert_eq!(state.active_channels(), MAX_GPU_FILTERS);
        assert!(state.has_channel("f3"));
        assert!(!state.has_channel("f4"));
    }

    #[test]
    fn test_time_range_offset() {
        let fields = fields();
        let filter = FilterDescriptor::new("t1", FilterType::TimeRange, FilterValue::Range([1_000_500.0, 1_000_900.0]))
            .for_table("t", "time", Some(1))
            .with_gpu(true)
            .with_domain([1_000_000.0, 2_000_000.0]);
        let state = DefaultGpuFilterBuilder::default().build(&[filter], "t", &fields);

        assert_eq!(state.filter_range[0], [500.0, 900.0]);
        let values = state.row_values(&fields, &[Value::Real(1.0), Value::Real(1_000_600.0)]);
        assert_eq!(values[0], 600.0);

        let missing = state.row_values(&fields, &[Value::Real(1.0), Value::Null]);
        assert_eq!(missing[0], GPU_MISSING_VALUE);
    }

    #[test]
    fn test_unresolved_field_is_skipped() {
        let fields = fields();
        let state = DefaultGpuFilterBuilder::default().build(&[range("a", 7, 0.0, 1.0)], "t", &fields);
        assert_eq!(state.active_channels(), 0);
    }
}
