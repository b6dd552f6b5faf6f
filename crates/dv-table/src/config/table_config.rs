//! Construction and filtering options

use serde::{Deserialize, Serialize};

use super::null_handling::NullConfig;

/// Default number of histogram bins in filter props
pub const HISTOGRAM_BINS: usize = 30;

/// Bin count of the enlarged histogram
pub const ENLARGED_HISTOGRAM_BINS: usize = 100;

/// Configuration applied when a table is constructed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Null handling for string cells
    pub null_config: NullConfig,

    /// Bins of the filter histogram
    pub histogram_bins: usize,

    /// Bins of the enlarged filter histogram
    pub enlarged_histogram_bins: usize,

    /// Whether lat/lng column pairs are detected on load
    pub detect_point_pairs: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            null_config: NullConfig::default(),
            histogram_bins: HISTOGRAM_BINS,
            enlarged_histogram_bins: ENLARGED_HISTOGRAM_BINS,
            detect_point_pairs: true,
        }
    }
}

/// Options for a single filter application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterOptions {
    /// Evaluate every filter on the CPU, including gpu-flagged ones
    pub cpu_only: bool,

    /// Treat every filter as fixed-domain
    pub ignore_domain: bool,
}

impl FilterOptions {
    /// Options of the CPU shadow path
    pub fn cpu_shadow() -> Self {
        Self {
            cpu_only: true,
            ignore_domain: true,
        }
    }
}
