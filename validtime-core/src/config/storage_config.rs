//! SQLite storage configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// How long a writer waits on a locked database.
    pub busy_timeout_ms: u64,
    /// Journal mode for file databases; in-memory databases ignore it.
    pub journal_mode: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5000,
            journal_mode: "WAL".to_string(),
        }
    }
}
