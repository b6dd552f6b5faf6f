//! In-memory tables with dual-track filtering
//!
//! A [`Table`] keeps one index set for rendering and one for computing scale
//! domains, so filters that run on the device or carry a fixed domain can be
//! honored without rescanning both sets on every change.

pub mod config;
pub mod domain;
pub mod field;
pub mod filter;
pub mod point_pairs;
pub mod record_batch;
pub mod sort;
pub mod table;

use arrow::error::ArrowError;
use thiserror::Error;

// Re-exports
pub use config::{FilterOptions, NullConfig, TableConfig};
pub use domain::{Domain, FilterProps, HistogramBin, ScaleType, TimeFormat};
pub use field::{Field, FieldSpec, ValueAccessor};
pub use filter::{
    DefaultGpuFilterBuilder, FilterChange, FilterChanges, FilterGroup, FilterRecord,
    FilterServices, GpuFilterBuilder, GpuFilterState,
};
pub use point_pairs::{find_point_field_pairs, PointFieldPair};
pub use sort::{SortMode, SortState};
pub use table::{Table, TableData, TableInfo, TableInput};

/// Errors that can occur while building a table
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Row {row} has {found} cells, expected {expected}")]
    RowArity {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    #[error("Unsupported type {data_type} of column '{name}'")]
    UnsupportedColumn { name: String, data_type: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for table operations
pub type Result<T> = std::result::Result<T, TableError>;
