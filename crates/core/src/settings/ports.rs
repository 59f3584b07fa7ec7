//! Port interfaces for settings persistence and the credential vault

use async_trait::async_trait;
use dealbridge_domain::{ConnectionIdentity, Result};

/// Process-level key/value settings persistence
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Atomically deletes every key starting with `prefix` and writes
    /// `entries` in its place. On error nothing changes. Returns how many
    /// keys were removed.
    async fn replace_prefix(&self, prefix: &str, entries: Vec<(String, String)>) -> Result<usize>;
}

/// OS secret store holding the ERP password, keyed by connection identity
pub trait CredentialVault: Send + Sync {
    fn get(&self, identity: &ConnectionIdentity) -> Result<Option<String>>;

    /// Writes or overwrites the password for `identity`.
    fn save(&self, identity: &ConnectionIdentity, password: &str) -> Result<()>;

    /// Deletes the password for `identity`. Deleting a missing entry succeeds.
    fn clear(&self, identity: &ConnectionIdentity) -> Result<()>;
}
