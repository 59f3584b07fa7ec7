use std::time::Duration;

use thiserror::Error;

/// Failure raised by the TDS connection manager and sessions
#[derive(Debug, Error)]
pub enum TdsError {
    #[error(transparent)]
    Driver(#[from] tiberius::error::Error),

    #[error("network error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}
