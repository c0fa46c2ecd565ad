//! Merge outcome counts.

use serde::{Deserialize, Serialize};

/// What a merge did to the target table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Rows loaded from the snapshot.
    pub staged: u64,
    /// Current rows terminated because their key left the snapshot (full mode).
    pub vanished: u64,
    /// Staged rows identical to the current version.
    pub unchanged: u64,
    /// Current rows terminated because the snapshot carries a new version.
    pub superseded: u64,
    /// New current rows written.
    pub inserted: u64,
    pub elapsed_ms: u64,
}

impl MergeReport {
    /// True when the merge wrote nothing.
    pub fn is_noop(&self) -> bool {
        self.vanished == 0 && self.superseded == 0 && self.inserted == 0
    }
}
