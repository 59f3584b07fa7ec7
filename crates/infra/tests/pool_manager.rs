//! ERP pool manager lifecycle against an in-memory connector.

use std::sync::Arc;
use std::time::Duration;

use dealbridge_core::erp::ErpSessionSource;
use dealbridge_core::testing::{FakeErp, InMemorySettingsStore, InMemoryVault};
use dealbridge_core::ConnectionSettingsService;
use dealbridge_domain::{
    ConnectionIdentity, ConnectionSettings, DealBridgeError, ErpConfig, PasswordUpdate, PoolState,
};
use dealbridge_infra::erp::{ErpPool, ErpPoolManager};
use dealbridge_infra::testing::FakeConnector;

fn settings() -> ConnectionSettings {
    ConnectionSettings {
        identity: ConnectionIdentity::new("erp.local", 1433, "eazybusiness", "sa"),
        encrypt: false,
        trust_server_certificate: true,
    }
}

struct Harness {
    connector: FakeConnector,
    settings: Arc<ConnectionSettingsService>,
    manager: ErpPoolManager,
}

impl Harness {
    fn new(connector: FakeConnector) -> Self {
        let settings = Arc::new(ConnectionSettingsService::new(
            Arc::new(InMemorySettingsStore::new()),
            Arc::new(InMemoryVault::new()),
        ));
        let manager = ErpPoolManager::new(
            Arc::new(connector.clone()),
            Arc::clone(&settings),
            ErpConfig::default(),
        );
        Self { connector, settings, manager }
    }

    async fn configured() -> Self {
        let harness = Self::new(FakeConnector::default());
        harness
            .settings
            .save_settings(&settings(), PasswordUpdate::Set("s3cret".into()))
            .await
            .expect("settings saved");
        harness
    }
}

async fn wait_for_state(manager: &ErpPoolManager, expected: PoolState) {
    for _ in 0..100 {
        if manager.state() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("pool never reached {expected:?}, stuck at {:?}", manager.state());
}

#[tokio::test]
async fn missing_settings_fail_without_opening_a_pool() {
    let harness = Harness::new(FakeConnector::default());

    let err = harness.manager.get_pool().await.err().expect("no settings stored");

    assert!(matches!(err, DealBridgeError::Config(_)));
    assert_eq!(harness.connector.opens(), 0);
    assert_eq!(harness.manager.state(), PoolState::Absent);
}

#[tokio::test]
async fn missing_password_is_a_config_error() {
    let harness = Harness::new(FakeConnector::default());
    harness.settings.save_settings(&settings(), PasswordUpdate::Unchanged).await.unwrap();

    let err = harness.manager.get_pool().await.err().expect("no password stored");

    match err {
        DealBridgeError::Config(message) => assert!(message.contains("no password")),
        other => panic!("expected config error, got {other:?}"),
    }
    assert_eq!(harness.connector.opens(), 0);
}

#[tokio::test]
async fn live_pool_is_reused() {
    let harness = Harness::configured().await;

    harness.manager.get_pool().await.unwrap();
    harness.manager.get_pool().await.unwrap();

    assert_eq!(harness.connector.opens(), 1);
    assert_eq!(harness.manager.state(), PoolState::Connected);

    let opened = harness.connector.opened().remove(0);
    assert_eq!(opened.password, "s3cret");
    assert_eq!(opened.limits, ErpConfig::default().live_limits());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_creation() {
    let connector = FakeConnector::default().with_delay(Duration::from_millis(50));
    let harness = Harness::new(connector);
    harness.settings.save_settings(&settings(), PasswordUpdate::Set("s3cret".into())).await.unwrap();

    let (a, b, c) = tokio::join!(
        harness.manager.get_pool(),
        harness.manager.get_pool(),
        harness.manager.get_pool()
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(harness.connector.opens(), 1);
}

#[tokio::test]
async fn background_error_tears_the_pool_down_and_next_call_recovers() {
    let harness = Harness::configured().await;
    harness.manager.get_pool().await.unwrap();
    let first = harness.connector.pool(0);

    first.emit_error("connection reset by peer");
    wait_for_state(&harness.manager, PoolState::Absent).await;

    assert!(first.is_closed());
    harness.manager.get_pool().await.unwrap();
    assert_eq!(harness.connector.opens(), 2);
    assert_eq!(harness.manager.state(), PoolState::Connected);
}

#[tokio::test]
async fn errors_from_a_retired_pool_are_ignored() {
    let harness = Harness::configured().await;
    harness.manager.get_pool().await.unwrap();
    let first = harness.connector.pool(0);

    harness.manager.close_pool().await;
    harness.manager.get_pool().await.unwrap();
    first.emit_error("late error from the old pool");
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(harness.manager.state(), PoolState::Connected);
    assert!(!harness.connector.pool(1).is_closed());
}

#[tokio::test]
async fn failed_handshake_leaves_no_pool() {
    let harness = Harness::configured().await;
    harness.connector.fail_next(DealBridgeError::Connection("Login failed for user 'sa'".into()));

    let err = harness.manager.get_pool().await.err().expect("handshake fails");

    assert_eq!(err, DealBridgeError::Connection("Login failed for user 'sa'".into()));
    assert_eq!(harness.manager.state(), PoolState::Absent);
    harness.manager.get_pool().await.expect("next call retries");
}

#[tokio::test]
async fn close_pool_is_idempotent() {
    let harness = Harness::configured().await;
    harness.manager.close_pool().await;

    harness.manager.get_pool().await.unwrap();
    harness.manager.close_pool().await;
    harness.manager.close_pool().await;

    assert!(harness.connector.pool(0).is_closed());
    assert_eq!(harness.manager.state(), PoolState::Absent);
}

#[tokio::test]
async fn connectivity_failures_reported_by_callers_close_the_pool() {
    let harness = Harness::configured().await;
    harness.manager.get_pool().await.unwrap();

    harness
        .manager
        .report_failure(&DealBridgeError::Transaction("deadlock victim".into()))
        .await;
    assert_eq!(harness.manager.state(), PoolState::Connected);

    harness.manager.report_failure(&DealBridgeError::Connection("socket closed".into())).await;
    assert_eq!(harness.manager.state(), PoolState::Absent);
    assert!(harness.connector.pool(0).is_closed());
}

#[tokio::test]
async fn acquire_hands_out_sessions_from_the_live_pool() {
    let harness = Harness::configured().await;

    let pool = harness.manager.get_pool().await.unwrap();
    pool.ping().await.expect("probe answers 1");
    let _session = harness.manager.acquire().await.unwrap();

    assert_eq!(harness.connector.opens(), 1);
    assert_eq!(harness.connector.erp().acquire_count(), 2);
}

#[tokio::test]
async fn test_connection_uses_an_isolated_pool() {
    let harness = Harness::configured().await;

    let reachable = harness.manager.test_connection(&settings(), Some("typed".into())).await;

    assert_eq!(reachable, Ok(true));

    assert_eq!(harness.manager.state(), PoolState::Absent);
    let opened = harness.connector.opened().remove(0);
    assert_eq!(opened.password, "typed");
    assert_eq!(opened.limits.max_size, 1);
    assert_eq!(opened.limits, ErpConfig::default().test_limits());
    assert!(opened.pool.is_closed());
}

#[tokio::test]
async fn test_connection_falls_back_to_the_stored_password() {
    let harness = Harness::configured().await;

    harness.manager.test_connection(&settings(), None).await.unwrap();
    harness.manager.test_connection(&settings(), Some(String::new())).await.unwrap();

    let opened = harness.connector.opened();
    assert!(opened.iter().all(|open| open.password == "s3cret"));
}

#[tokio::test]
async fn test_connection_without_any_password_fails_fast() {
    let harness = Harness::new(FakeConnector::default());

    let err = harness.manager.test_connection(&settings(), None).await.unwrap_err();

    assert!(matches!(err, DealBridgeError::Config(_)));
    assert_eq!(harness.connector.opens(), 0);
}

#[tokio::test]
async fn test_connection_surfaces_the_transport_message() {
    let harness = Harness::configured().await;
    harness.connector.fail_next(DealBridgeError::Connection("No such host is known".into()));

    let err = harness.manager.test_connection(&settings(), None).await.unwrap_err();

    assert_eq!(err.to_string(), "Connection failed: No such host is known");
}

#[tokio::test]
async fn checkout_connectivity_failure_closes_the_pool() {
    let erp = FakeErp::new();
    let harness = Harness::new(FakeConnector::new(erp.clone()));
    harness.settings.save_settings(&settings(), PasswordUpdate::Set("s3cret".into())).await.unwrap();
    harness.manager.get_pool().await.unwrap();

    erp.fail_acquire(DealBridgeError::Connection("connection reset".into()));
    let err = harness.manager.acquire().await.err().expect("checkout fails");

    assert!(err.is_connectivity());
    assert_eq!(harness.manager.state(), PoolState::Absent);
    assert!(harness.connector.pool(0).is_closed());

    erp.clear_acquire_failure();
    harness.manager.acquire().await.expect("fresh pool after teardown");
    assert_eq!(harness.connector.opens(), 2);
}
