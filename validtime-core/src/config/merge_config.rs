//! Temporal merge configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the snapshot merge engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Suffix of the staging relation holding the incoming snapshot.
    pub staging_suffix: String,
    /// Suffix of the relation holding keys selected for termination.
    pub term_suffix: String,
    /// Snapshot cell text loaded as NULL.
    pub null_token: String,
    /// Index the key columns of staging relations before joining.
    pub index_staging: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            staging_suffix: "_temp".to_string(),
            term_suffix: "_term_temp".to_string(),
            null_token: String::new(),
            index_staging: true,
        }
    }
}
