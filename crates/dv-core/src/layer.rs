use serde::{Deserialize, Serialize};

/// Columns holding a layer's point position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionColumns {
    pub lat: String,
    pub lng: String,
}

/// The part of a visual layer the table model needs to know about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerInfo {
    /// Layer id, referenced by polygon filters
    pub id: String,

    /// Id of the table the layer draws
    pub data_id: String,

    /// Point position columns, if the layer is point based
    #[serde(default)]
    pub position: Option<PositionColumns>,
}

impl LayerInfo {
    pub fn new(id: impl Into<String>, data_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data_id: data_id.into(),
            position: None,
        }
    }

    /// Attach lat/lng position columns
    pub fn with_position(mut self, lat: impl Into<String>, lng: impl Into<String>) -> Self {
        self.position = Some(PositionColumns {
            lat: lat.into(),
            lng: lng.into(),
        });
        self
    }
}
