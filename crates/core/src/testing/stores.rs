//! In-memory local collaborators: customers, settings, vault, reference cache

#![allow(clippy::missing_errors_doc)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dealbridge_domain::{
    ConnectionIdentity, Customer, DealBridgeError, ReferenceEntity, ReferenceKind, Result,
};
use parking_lot::Mutex;

use crate::orders::ports::CustomerDirectory;
use crate::reference::ports::ReferenceCache;
use crate::settings::ports::{CredentialVault, SettingsStore};

/// Customer lookup seeded up front
#[derive(Clone, Default)]
pub struct InMemoryCustomerDirectory {
    customers: Arc<Mutex<HashMap<i64, Customer>>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_customer(self, customer: Customer) -> Self {
        self.insert(customer);
        self
    }

    pub fn insert(&self, customer: Customer) {
        self.customers.lock().insert(customer.id, customer);
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn get_customer_by_id(&self, id: i64) -> Result<Option<Customer>> {
        Ok(self.customers.lock().get(&id).cloned())
    }
}

/// Key/value settings kept in a sorted map
#[derive(Clone, Default)]
pub struct InMemorySettingsStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
    failing: Arc<AtomicBool>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored key.
    #[must_use]
    pub fn values(&self) -> BTreeMap<String, String> {
        self.values.lock().clone()
    }

    /// Make every write fail as a busy database would.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DealBridgeError::Database("database is busy".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn replace_prefix(&self, prefix: &str, entries: Vec<(String, String)>) -> Result<usize> {
        self.check_writable()?;
        let mut values = self.values.lock();
        let before = values.len();
        values.retain(|key, _| !key.starts_with(prefix));
        let removed = before - values.len();
        values.extend(entries);
        Ok(removed)
    }
}

/// Credential vault keyed by [`ConnectionIdentity::vault_account`]
#[derive(Clone, Default)]
pub struct InMemoryVault {
    secrets: Arc<Mutex<HashMap<String, String>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a locked OS secret store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    #[must_use]
    pub fn stored(&self, identity: &ConnectionIdentity) -> Option<String> {
        self.secrets.lock().get(&identity.vault_account()).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secrets.lock().is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(DealBridgeError::Credentials("secret store is locked".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CredentialVault for InMemoryVault {
    fn get(&self, identity: &ConnectionIdentity) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.stored(identity))
    }

    fn save(&self, identity: &ConnectionIdentity, password: &str) -> Result<()> {
        self.check_available()?;
        self.secrets.lock().insert(identity.vault_account(), password.to_string());
        Ok(())
    }

    fn clear(&self, identity: &ConnectionIdentity) -> Result<()> {
        self.check_available()?;
        self.secrets.lock().remove(&identity.vault_account());
        Ok(())
    }
}

/// Reference cache with one map per kind
#[derive(Clone, Default)]
pub struct InMemoryReferenceCache {
    tables: Arc<Mutex<HashMap<ReferenceKind, BTreeMap<i32, String>>>>,
}

impl InMemoryReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of one kind ordered by `erp_id`.
    #[must_use]
    pub fn rows(&self, kind: ReferenceKind) -> Vec<ReferenceEntity> {
        self.tables
            .lock()
            .get(&kind)
            .map(|table| {
                table.iter().map(|(id, name)| ReferenceEntity::new(*id, name.clone())).collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReferenceCache for InMemoryReferenceCache {
    async fn upsert_all(&self, kind: ReferenceKind, entities: &[ReferenceEntity]) -> Result<usize> {
        let mut tables = self.tables.lock();
        let table = tables.entry(kind).or_default();
        for entity in entities {
            table.insert(entity.erp_id, entity.name.clone());
        }
        Ok(entities.len())
    }

    async fn list(&self, kind: ReferenceKind) -> Result<Vec<ReferenceEntity>> {
        let mut rows = self.rows(kind);
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.erp_id.cmp(&b.erp_id)));
        Ok(rows)
    }
}
