//! Connection settings service - core business logic
//!
//! Non-secret parameters go to the settings store under the `erp.` prefix.
//! The password goes to the credential vault keyed by the connection
//! identity, so a settings dump never contains it.

use std::fmt;
use std::sync::Arc;

use dealbridge_domain::{
    ConnectionIdentity, ConnectionSettings, DealBridgeError, PasswordUpdate, Result,
};
use tracing::{debug, error, info, instrument, warn};

use super::ports::{CredentialVault, SettingsStore};

/// Settings keys
pub mod keys {
    pub const PREFIX: &str = "erp.";
    pub const HOST: &str = "erp.host";
    pub const PORT: &str = "erp.port";
    pub const DATABASE: &str = "erp.database";
    pub const USER: &str = "erp.user";
    pub const ENCRYPT: &str = "erp.encrypt";
    pub const TRUST_SERVER_CERTIFICATE: &str = "erp.trust_server_certificate";
}

/// Settings plus password, everything needed to open a pool
#[derive(Clone)]
pub struct ConnectionTarget {
    pub settings: ConnectionSettings,
    pub password: String,
}

impl fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionTarget")
            .field("settings", &self.settings)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection settings service
pub struct ConnectionSettingsService {
    store: Arc<dyn SettingsStore>,
    vault: Arc<dyn CredentialVault>,
}

impl ConnectionSettingsService {
    pub fn new(store: Arc<dyn SettingsStore>, vault: Arc<dyn CredentialVault>) -> Self {
        Self { store, vault }
    }

    /// Replaces the stored settings and applies the password intent.
    ///
    /// All `erp.*` keys are replaced in one write, so a failed save keeps
    /// the previous settings. When the settings were written but the vault
    /// rejected the password change, the call still fails with a credentials
    /// error.
    #[instrument(skip_all, fields(identity = %settings.identity, password = ?password))]
    pub async fn save_settings(
        &self,
        settings: &ConnectionSettings,
        password: PasswordUpdate,
    ) -> Result<()> {
        let missing = settings.identity.missing_fields();
        if !missing.is_empty() {
            return Err(DealBridgeError::Validation(format!(
                "missing connection fields: {}",
                missing.join(", ")
            )));
        }

        let identity = &settings.identity;
        let entries = vec![
            (keys::HOST.to_string(), identity.host.trim().to_string()),
            (keys::PORT.to_string(), identity.port.to_string()),
            (keys::DATABASE.to_string(), identity.database.trim().to_string()),
            (keys::USER.to_string(), identity.user.trim().to_string()),
            (keys::ENCRYPT.to_string(), bool_value(settings.encrypt).to_string()),
            (
                keys::TRUST_SERVER_CERTIFICATE.to_string(),
                bool_value(settings.trust_server_certificate).to_string(),
            ),
        ];
        let cleared = self.store.replace_prefix(keys::PREFIX, entries).await?;
        debug!(cleared, "replaced previous connection settings");

        let stored = self.get_settings().await?.unwrap_or_else(|| settings.clone());
        let vault_result = match password {
            PasswordUpdate::Unchanged => Ok(()),
            PasswordUpdate::Clear => self.vault.clear(&stored.identity),
            PasswordUpdate::Set(ref secret) => self.vault.save(&stored.identity, secret),
        };

        if let Err(err) = vault_result {
            error!(error = %err, "credential vault rejected password update");
            return Err(DealBridgeError::Credentials(
                DealBridgeError::CREDENTIAL_SAVE_FAILED.to_string(),
            ));
        }

        info!("connection settings saved");
        Ok(())
    }

    /// Stored settings, or `None` when no complete set has been saved.
    pub async fn get_settings(&self) -> Result<Option<ConnectionSettings>> {
        let Some(host) = self.store.get(keys::HOST).await? else {
            return Ok(None);
        };
        let Some(port) = self.store.get(keys::PORT).await? else {
            return Ok(None);
        };
        let Some(database) = self.store.get(keys::DATABASE).await? else {
            return Ok(None);
        };
        let Some(user) = self.store.get(keys::USER).await? else {
            return Ok(None);
        };

        let port = port.trim().parse::<u16>().map_err(|_| {
            DealBridgeError::Config(format!("stored ERP port is not a valid port: {port}"))
        })?;

        Ok(Some(ConnectionSettings {
            identity: ConnectionIdentity::new(host, port, database, user),
            encrypt: self.read_flag(keys::ENCRYPT).await?,
            trust_server_certificate: self.read_flag(keys::TRUST_SERVER_CERTIFICATE).await?,
        }))
    }

    /// Password stored for `identity`, if any.
    pub fn password_for(&self, identity: &ConnectionIdentity) -> Result<Option<String>> {
        self.vault.get(identity).map_err(|err| {
            warn!(error = %err, identity = %identity, "credential vault lookup failed");
            DealBridgeError::Credentials(format!("failed to read stored password: {err}"))
        })
    }

    /// Settings and password for the shared pool.
    ///
    /// Missing settings or a missing password is a configuration error so
    /// that no network activity happens with an incomplete target.
    pub async fn load_target(&self) -> Result<ConnectionTarget> {
        let settings = self.get_settings().await?.ok_or_else(|| {
            DealBridgeError::Config("ERP connection settings are not configured".to_string())
        })?;

        let missing = settings.identity.missing_fields();
        if !missing.is_empty() {
            return Err(DealBridgeError::Config(format!(
                "ERP connection settings are incomplete: {}",
                missing.join(", ")
            )));
        }

        let password = self.password_for(&settings.identity)?.ok_or_else(|| {
            DealBridgeError::Config(format!("no password stored for {}", settings.identity))
        })?;

        Ok(ConnectionTarget { settings, password })
    }

    /// Deletes the password of the currently configured identity.
    #[instrument(skip(self))]
    pub async fn clear_password(&self) -> Result<()> {
        let settings = self.get_settings().await?.ok_or_else(|| {
            DealBridgeError::Config("ERP connection settings are not configured".to_string())
        })?;

        self.vault.clear(&settings.identity).map_err(|err| {
            error!(error = %err, "credential vault rejected password removal");
            DealBridgeError::Credentials(format!("failed to remove stored password: {err}"))
        })?;

        info!(identity = %settings.identity, "stored password cleared");
        Ok(())
    }

    async fn read_flag(&self, key: &str) -> Result<bool> {
        Ok(self.store.get(key).await?.is_some_and(|value| value.trim() == "true"))
    }
}

const fn bool_value(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}
