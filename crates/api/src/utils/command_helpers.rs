//! Command execution helpers
//!
//! Times a command, logs its outcome and error label, and hands the result
//! back untouched.

use std::future::Future;
use std::time::Instant;

use dealbridge_domain::Result as DomainResult;
use tracing::warn;

use crate::utils::logging::{error_label, log_command_execution};

/// Execute a command with timing and outcome logging.
pub async fn execute_logged<F, Fut, T>(command_name: &str, command_fn: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();
    let result = command_fn().await;

    if let Err(err) = &result {
        warn!(command = command_name, error_type = error_label(err), error = %err, "command failed");
    }
    log_command_execution(command_name, start.elapsed(), result.is_ok());

    result
}
