//! Application context - dependency injection container

use std::sync::Arc;

use dealbridge_core::{
    ConnectionSettingsService, CredentialVault, OrderDefaults, OrderService,
    ReferenceSyncService,
};
use dealbridge_domain::{Config, Result};
use dealbridge_infra::{
    config, ErpConnector, ErpPoolManager, KeyringCredentialVault, LocalDbManager,
    SqliteCustomerDirectory, SqliteReferenceCache, SqliteSettingsStore, TdsConnector,
};
use tracing::{info, warn};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<LocalDbManager>,
    pub settings: Arc<ConnectionSettingsService>,
    pub erp_pool: Arc<ErpPoolManager>,
    pub orders: Arc<OrderService>,
    pub reference_sync: Arc<ReferenceSyncService>,
    pub customers: Arc<SqliteCustomerDirectory>,
}

impl AppContext {
    /// Build the context from `.env`, environment and config files.
    pub fn new() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => info!(path = %path.display(), "loaded .env"),
            Err(e) => warn!(error = %e, "could not load .env file"),
        }
        let config = config::load()?;
        Self::new_with_config(config)
    }

    /// Build the context for `config` with the OS keychain and a real ERP
    /// connector.
    pub fn new_with_config(config: Config) -> Result<Self> {
        let vault = Arc::new(KeyringCredentialVault::platform(&config.erp.keychain_service));
        Self::with_adapters(config, vault, Arc::new(TdsConnector))
    }

    /// Build the context with injected vault and ERP connector.
    ///
    /// Opens and migrates the local store named in `config`.
    pub fn with_adapters(
        config: Config,
        vault: Arc<dyn CredentialVault>,
        connector: Arc<dyn ErpConnector>,
    ) -> Result<Self> {
        let db = Arc::new(LocalDbManager::open(&config.database)?);

        let settings = Arc::new(ConnectionSettingsService::new(
            Arc::new(SqliteSettingsStore::new(Arc::clone(&db))),
            vault,
        ));
        let erp_pool = Arc::new(ErpPoolManager::new(
            connector,
            Arc::clone(&settings),
            config.erp.clone(),
        ));
        let customers = Arc::new(SqliteCustomerDirectory::new(Arc::clone(&db)));
        let orders = Arc::new(OrderService::new(
            erp_pool.clone(),
            customers.clone(),
            OrderDefaults::from(&config.erp),
        ));
        let reference_sync = Arc::new(ReferenceSyncService::new(
            erp_pool.clone(),
            Arc::new(SqliteReferenceCache::new(Arc::clone(&db))),
        ));

        info!(db_path = %db.path().display(), "DealBridge context initialised");

        Ok(Self { config, db, settings, erp_pool, orders, reference_sync, customers })
    }

    /// Close the shared ERP pool.
    pub async fn shutdown(&self) {
        self.erp_pool.close_pool().await;
        info!("DealBridge context shut down");
    }
}
