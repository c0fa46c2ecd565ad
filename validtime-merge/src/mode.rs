//! Snapshot mode: what the absence of a key means.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use validtime_core::{ValidtimeError, ValidtimeResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotMode {
    /// The snapshot is complete; current rows whose key is missing are
    /// terminated.
    #[default]
    Full,
    /// The snapshot only carries updates; missing keys are left alone.
    Delta,
}

impl SnapshotMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Delta => "delta",
        }
    }
}

impl fmt::Display for SnapshotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotMode {
    type Err = ValidtimeError;

    fn from_str(s: &str) -> ValidtimeResult<Self> {
        match s {
            "full" => Ok(Self::Full),
            "delta" => Ok(Self::Delta),
            other => Err(ValidtimeError::InvalidArgument(format!(
                "unknown snapshot mode {other:?}, expected \"full\" or \"delta\""
            ))),
        }
    }
}
