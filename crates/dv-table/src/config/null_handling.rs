//! Null value handling for table construction

use dv_core::Value;
use serde::{Deserialize, Serialize};

/// Null value configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullConfig {
    /// String cells matching any of these patterns load as missing
    pub patterns: Vec<String>,

    /// Whether to trim whitespace before checking
    pub trim_whitespace: bool,

    /// Case sensitive matching
    pub case_sensitive: bool,
}

impl Default for NullConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                String::new(), // Empty string
                "N/A".to_string(),
                "null".to_string(),
                "None".to_string(),
                "NaN".to_string(),
            ],
            trim_whitespace: true,
            case_sensitive: false,
        }
    }
}

impl NullConfig {
    /// A configuration that never treats a string as missing
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
            trim_whitespace: false,
            case_sensitive: true,
        }
    }

    /// Check if a value should be treated as null
    pub fn is_null(&self, value: &str) -> bool {
        let test_value = if self.trim_whitespace {
            value.trim()
        } else {
            value
        };

        self.patterns.iter().any(|pattern| {
            if self.case_sensitive {
                test_value == pattern
            } else {
                test_value.eq_ignore_ascii_case(pattern)
            }
        })
    }

    /// Replace string cells that match a null pattern
    pub fn normalize(&self, cell: Value) -> Value {
        match cell {
            Value::Str(s) if self.is_null(&s) => Value::Null,
            other => other,
        }
    }

    /// Add a null pattern
    pub fn add_pattern(&mut self, pattern: String) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    /// Remove a null pattern
    pub fn remove_pattern(&mut self, pattern: &str) {
        self.patterns.retain(|p| p != pattern);
    }
}
