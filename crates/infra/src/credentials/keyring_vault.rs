use std::sync::Arc;

use dealbridge_common::{KeychainError, KeychainProvider, SecretStore};
use dealbridge_core::CredentialVault;
use dealbridge_domain::{ConnectionIdentity, Result};
use tracing::debug;

use crate::errors::InfraError;

/// Stores one ERP password per [`ConnectionIdentity`].
///
/// The account name is `host:port-database-user`, so changing any identity
/// field looks up a different entry.
#[derive(Clone)]
pub struct KeyringCredentialVault {
    store: Arc<dyn SecretStore>,
}

impl KeyringCredentialVault {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Vault over the platform keychain under `service_name`.
    pub fn platform(service_name: impl Into<String>) -> Self {
        Self::new(Arc::new(KeychainProvider::new(service_name)))
    }
}

impl CredentialVault for KeyringCredentialVault {
    fn get(&self, identity: &ConnectionIdentity) -> Result<Option<String>> {
        match self.store.get_secret(&identity.vault_account()) {
            Ok(secret) => Ok(Some(secret)),
            Err(KeychainError::NotFound) => Ok(None),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }

    fn save(&self, identity: &ConnectionIdentity, password: &str) -> Result<()> {
        self.store
            .set_secret(&identity.vault_account(), password)
            .map_err(|err| InfraError::from(err).into())
    }

    fn clear(&self, identity: &ConnectionIdentity) -> Result<()> {
        match self.store.delete_secret(&identity.vault_account()) {
            Ok(()) | Err(KeychainError::NotFound) => {
                debug!(target = %identity, "ERP password cleared");
                Ok(())
            }
            Err(err) => Err(InfraError::from(err).into()),
        }
    }
}
