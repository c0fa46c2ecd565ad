pub mod merge_config;
pub mod observability_config;
pub mod storage_config;

use serde::{Deserialize, Serialize};

pub use merge_config::MergeConfig;
pub use observability_config::ObservabilityConfig;
pub use storage_config::StorageConfig;

use crate::errors::{ValidtimeError, ValidtimeResult};

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ValidtimeConfig {
    pub merge: MergeConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
}

impl ValidtimeConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> ValidtimeResult<Self> {
        toml::from_str(toml_str).map_err(|e| ValidtimeError::ConfigError(e.to_string()))
    }

    /// Load config from a TOML file.
    pub fn from_path(path: &std::path::Path) -> ValidtimeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = ValidtimeConfig::from_toml("").unwrap();
        assert_eq!(config.merge.staging_suffix, "_temp");
        assert_eq!(config.merge.term_suffix, "_term_temp");
        assert_eq!(config.storage.busy_timeout_ms, 5000);
        assert_eq!(config.observability.log_filter, "info");
    }

    #[test]
    fn test_partial_override() {
        let config = ValidtimeConfig::from_toml(
            r#"
            [merge]
            null_token = "\\N"
            index_staging = false

            [observability]
            json_logs = true
            "#,
        )
        .unwrap();
        assert_eq!(config.merge.null_token, "\\N");
        assert!(!config.merge.index_staging);
        assert_eq!(config.merge.staging_suffix, "_temp");
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = ValidtimeConfig::from_toml("[merge\nnull_token = 1").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }
}
