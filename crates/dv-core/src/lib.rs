//! Core types shared across the table model
//!
//! This crate provides the cell value model, ordering helpers, id generation
//! and the filter/layer descriptors that the UI side hands to a table.

pub mod compare;
pub mod filter;
pub mod id;
pub mod layer;
pub mod value;

// Re-export commonly used types
pub use compare::{ascending, descending};
pub use filter::{
    DatasetFieldResolver, FieldIndexResolver, FilterDescriptor, FilterType, FilterValue,
};
pub use id::generate_id;
pub use layer::{LayerInfo, PositionColumns};
pub use value::{FieldType, Row, Value, ValueKey};
