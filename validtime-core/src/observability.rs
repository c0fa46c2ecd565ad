//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins over `config.log_filter`. Returns false when a global
/// subscriber was already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.is_ok()
}
