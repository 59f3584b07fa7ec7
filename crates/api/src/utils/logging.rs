use std::time::Duration;

use dealbridge_domain::DealBridgeError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Env var consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "DEALBRIDGE_LOG";

/// Install the global tracing subscriber.
///
/// The filter comes from `DEALBRIDGE_LOG`, then `RUST_LOG`, then `info`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(json: bool) {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        info!(json, "tracing initialised");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `DealBridgeError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &DealBridgeError) -> &'static str {
    match error {
        DealBridgeError::Config(_) => "config",
        DealBridgeError::Validation(_) => "validation",
        DealBridgeError::Connection(_) => "connection",
        DealBridgeError::Transaction(_) => "transaction",
        DealBridgeError::Credentials(_) => "credentials",
        DealBridgeError::Database(_) => "database",
        DealBridgeError::NotFound(_) => "not_found",
        DealBridgeError::InvalidInput(_) => "invalid_input",
        DealBridgeError::Internal(_) => "internal",
    }
}
