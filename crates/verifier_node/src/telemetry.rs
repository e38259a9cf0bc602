//! Tracing subscriber setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::CoreError;

use crate::config::LogFormat;

/// Installs the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `log_level` when set.
///
/// # Errors
///
/// Returns `CoreError::Configuration` if the level is not a valid filter or a
/// global subscriber is already installed.
pub fn init_tracing(log_level: &str, format: LogFormat) -> Result<(), CoreError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .map_err(|e| {
                CoreError::configuration(format!("invalid log level {log_level:?}: {e}"))
            })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };

    installed.map_err(|e| CoreError::configuration(format!("tracing already initialised: {e}")))
}
