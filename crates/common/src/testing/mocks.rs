//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::security::{KeychainError, SecretStore};

type StorageData = Arc<Mutex<HashMap<String, String>>>;

/// In-memory keychain for tests.
///
/// Clones share storage, so a test can hand one clone to the code under test
/// and inspect the other.
///
/// # Examples
///
/// ```
/// use dealbridge_common::security::SecretStore;
/// use dealbridge_common::testing::MockKeychainProvider;
///
/// let keychain = MockKeychainProvider::new("DealBridgeTest");
/// keychain.set_secret("account", "secret").unwrap();
/// assert_eq!(keychain.get_secret("account").unwrap(), "secret");
/// ```
#[derive(Debug, Clone)]
pub struct MockKeychainProvider {
    storage: StorageData,
    unavailable: Arc<AtomicBool>,
    service_name: String,
}

impl MockKeychainProvider {
    /// Create a new mock keychain provider with a service name for namespacing.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            storage: Arc::new(Mutex::new(HashMap::new())),
            unavailable: Arc::new(AtomicBool::new(false)),
            service_name: service_name.into(),
        }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Determine whether a secret exists.
    #[must_use]
    pub fn secret_exists(&self, account: &str) -> bool {
        self.storage.lock().contains_key(account)
    }

    /// Number of stored secrets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.lock().is_empty()
    }

    /// Simulate a locked or missing platform keychain.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), KeychainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(KeychainError::AccessFailed("mock keychain unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MockKeychainProvider {
    fn default() -> Self {
        Self::new("dealbridge-test")
    }
}

impl SecretStore for MockKeychainProvider {
    fn set_secret(&self, account: &str, value: &str) -> Result<(), KeychainError> {
        self.check_available()?;
        self.storage.lock().insert(account.to_string(), value.to_string());
        Ok(())
    }

    fn get_secret(&self, account: &str) -> Result<String, KeychainError> {
        self.check_available()?;
        self.storage.lock().get(account).cloned().ok_or(KeychainError::NotFound)
    }

    fn delete_secret(&self, account: &str) -> Result<(), KeychainError> {
        self.check_available()?;
        self.storage.lock().remove(account);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_storage() {
        let keychain = MockKeychainProvider::default();
        let observer = keychain.clone();

        keychain.set_secret("account", "secret").unwrap();

        assert!(observer.secret_exists("account"));
        assert_eq!(observer.len(), 1);
    }

    #[test]
    fn unavailable_flag_is_shared_between_clones() {
        let keychain = MockKeychainProvider::new("svc");
        let other = keychain.clone();
        other.set_unavailable(true);

        assert!(keychain.get_secret("account").is_err());
        assert!(keychain.is_empty());
        assert_eq!(keychain.service_name(), "svc");
    }
}
