//! Structured logging setup.

use crate::config::TracingSettings;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter directive does not parse.
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Installs a compact `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over [`TracingSettings::log_level`].
///
/// # Errors
///
/// Returns [`TelemetryError`] when the configured level is malformed or a
/// subscriber was already installed.
pub fn init_tracing(settings: &TracingSettings) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.log_level)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))
}
