//! Filtering: predicate construction, filter classification, the index scan
//! and device filter parameters

pub mod engine;
pub mod evaluator;
pub mod gpu;
pub mod record;

pub use engine::{apply_filters, FilterResult, PredicateGroups};
pub use evaluator::{build_predicate, Predicate};
pub use gpu::{DefaultGpuFilterBuilder, GpuChannel, GpuFilterBuilder, GpuFilterState, MAX_GPU_FILTERS};
pub use record::{FilterChange, FilterChanges, FilterGroup, FilterRecord};

use dv_core::{DatasetFieldResolver, FieldIndexResolver};
use std::sync::Arc;

/// Collaborators a table calls out to while filtering
#[derive(Debug, Clone)]
pub struct FilterServices {
    pub resolver: Arc<dyn FieldIndexResolver>,
    pub gpu: Arc<dyn GpuFilterBuilder>,
}

impl FilterServices {
    /// Services sharing one resolver
    pub fn with_resolver(resolver: Arc<dyn FieldIndexResolver>) -> Self {
        Self {
            gpu: Arc::new(DefaultGpuFilterBuilder::new(Arc::clone(&resolver))),
            resolver,
        }
    }
}

impl Default for FilterServices {
    fn default() -> Self {
        Self::with_resolver(Arc::new(DatasetFieldResolver))
    }
}
