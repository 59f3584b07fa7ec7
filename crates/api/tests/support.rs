//! Shared harness for app command tests.

use std::sync::Arc;

use dealbridge_app::AppContext;
use dealbridge_core::testing::{FakeErp, InMemoryVault};
use dealbridge_domain::{Config, DatabaseConfig};
use dealbridge_infra::testing::FakeConnector;
use tempfile::TempDir;

/// Context over a temporary SQLite file, an in-memory vault and a fake ERP.
pub struct TestApp {
    pub ctx: AppContext,
    pub erp: FakeErp,
    pub vault: InMemoryVault,
    pub connector: FakeConnector,
    /// Keep temporary directory alive for the lifetime of the context.
    _temp_dir: TempDir,
}

pub fn setup_app(erp: FakeErp) -> TestApp {
    let temp_dir = TempDir::new().expect("failed to create temporary directory");
    let config = Config {
        database: DatabaseConfig {
            path: temp_dir.path().join("dealbridge.db").to_string_lossy().into_owned(),
            pool_size: 4,
        },
        ..Config::default()
    };

    let vault = InMemoryVault::new();
    let connector = FakeConnector::new(erp.clone());
    let ctx = AppContext::with_adapters(config, Arc::new(vault.clone()), Arc::new(connector.clone()))
        .expect("context should initialise");

    TestApp { ctx, erp, vault, connector, _temp_dir: temp_dir }
}
