//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for DealBridge
///
/// Variants follow the integration's error taxonomy: configuration and
/// validation problems fail fast before any network call, connectivity and
/// transactional failures carry the underlying driver message verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DealBridgeError {
    /// Required settings or ERP ids are missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request cannot be processed (no valid products, unlinked customer).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Handshake, timeout or transport failure against the ERP database.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A statement inside the order transaction failed.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// The OS secret store rejected the operation.
    #[error("Credential store error: {0}")]
    Credentials(String),

    /// Local store failure.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DealBridgeError {
    /// Message surfaced when the secret store rejects a save.
    pub const CREDENTIAL_SAVE_FAILED: &'static str = "failed to save credentials securely";

    /// Returns true for transport-level failures that should tear the pool down.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type alias for DealBridge operations
pub type Result<T> = std::result::Result<T, DealBridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let err = DealBridgeError::Transaction("Invalid object name 'tArtikel'".into());
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["type"], "Transaction");
        assert_eq!(json["message"], "Invalid object name 'tArtikel'");
    }

    #[test]
    fn only_connection_errors_are_connectivity() {
        assert!(DealBridgeError::Connection("timed out".into()).is_connectivity());
        assert!(!DealBridgeError::Transaction("deadlock".into()).is_connectivity());
        assert!(!DealBridgeError::Config("missing host".into()).is_connectivity());
    }
}
