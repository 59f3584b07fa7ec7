//! Generic keychain provider for secure credential storage
//!
//! Thin wrapper over the platform keychain for storing arbitrary secrets on
//! macOS (Keychain Access), Windows (Credential Manager), and Linux (Secret
//! Service API).
//!
//! ## Module Relationships
//!
//! - This module: generic secret storage addressed by `(service, account)`
//! - `dealbridge_infra::credentials`: ERP passwords keyed by connection
//!   identity, built on [`SecretStore`]
//! - `testing::MockKeychainProvider`: in-memory [`SecretStore`] for tests
//!
//! ## Usage
//!
//! ```no_run
//! # #[cfg(feature = "platform")]
//! # {
//! use dealbridge_common::security::{KeychainProvider, SecretStore};
//!
//! let keychain = KeychainProvider::new("DealBridge.erp");
//! keychain.set_secret("erp.local:1433-eazybusiness-sa", "super-secret")?;
//! let secret = keychain.get_secret("erp.local:1433-eazybusiness-sa")?;
//! assert_eq!(secret, "super-secret");
//! # }
//! # Ok::<(), dealbridge_common::security::KeychainError>(())
//! ```

use thiserror::Error;
#[cfg(feature = "platform")]
use tracing::debug;

/// Secret storage addressed by account within one service namespace.
pub trait SecretStore: Send + Sync {
    /// Store or overwrite a secret.
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if the store rejects the write.
    fn set_secret(&self, account: &str, value: &str) -> Result<(), KeychainError>;

    /// Retrieve a secret.
    ///
    /// # Errors
    /// Returns `KeychainError::NotFound` if no secret exists for `account`.
    fn get_secret(&self, account: &str) -> Result<String, KeychainError>;

    /// Delete a secret (idempotent).
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if the store rejects the delete.
    fn delete_secret(&self, account: &str) -> Result<(), KeychainError>;
}

/// Platform keychain provider
#[cfg(feature = "platform")]
#[derive(Debug, Clone)]
pub struct KeychainProvider {
    service_name: String,
}

#[cfg(feature = "platform")]
impl KeychainProvider {
    /// Create a new keychain provider for a specific service
    ///
    /// # Arguments
    /// * `service_name` - Service identifier (e.g., "DealBridge.erp")
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    fn create_entry(&self, account: &str) -> Result<keyring::Entry, KeychainError> {
        keyring::Entry::new(&self.service_name, account).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to create keychain entry: {}", e))
        })
    }
}

#[cfg(feature = "platform")]
impl SecretStore for KeychainProvider {
    fn set_secret(&self, account: &str, value: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, account = %account, "Storing secret in keychain");

        let entry = self.create_entry(account)?;
        entry.set_password(value).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to store secret for {}: {}", account, e))
        })?;

        debug!(service = %self.service_name, account = %account, "Secret stored successfully");
        Ok(())
    }

    fn get_secret(&self, account: &str) -> Result<String, KeychainError> {
        debug!(service = %self.service_name, account = %account, "Retrieving secret from keychain");

        let entry = self.create_entry(account)?;
        entry.get_password().map_err(|e| {
            if matches!(e, keyring::Error::NoEntry) {
                KeychainError::NotFound
            } else {
                KeychainError::AccessFailed(format!(
                    "Failed to retrieve secret for {}: {}",
                    account, e
                ))
            }
        })
    }

    fn delete_secret(&self, account: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, account = %account, "Deleting secret from keychain");

        let entry = self.create_entry(account)?;
        if let Err(e) = entry.delete_credential() {
            if !matches!(e, keyring::Error::NoEntry) {
                return Err(KeychainError::AccessFailed(format!(
                    "Failed to delete secret for {}: {}",
                    account, e
                )));
            }
        }

        debug!(service = %self.service_name, account = %account, "Secret deleted successfully");
        Ok(())
    }
}

/// Keychain error types
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Keychain access failed (permission denied, not available, etc.)
    #[error("Keychain access failed: {0}")]
    AccessFailed(String),

    /// Entry not found in keychain
    #[error("Entry not found")]
    NotFound,

    /// Underlying keyring library error
    #[cfg(feature = "platform")]
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}
