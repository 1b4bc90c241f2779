//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events; binaries and integration tests
//! install a subscriber once through [`init_tracing`].

use bookdesk_domain::{BookdeskError, LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber described by `config`
///
/// An unparseable `level` directive falls back to `info`.
///
/// # Errors
/// Returns `BookdeskError::Config` if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), BookdeskError> {
    let filter = build_filter(&config.level);

    let installed = match config.format {
        LogFormat::Json => fmt().with_env_filter(filter).json().try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).try_init(),
    };

    installed.map_err(|e| BookdeskError::Config(format!("tracing already initialized: {}", e)))
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}
