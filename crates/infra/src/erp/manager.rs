//! Process-wide ERP pool manager
//!
//! Holds at most one live pool. Creation is single-flight: concurrent callers
//! wait on the same slot and share the pool that the first one opened. A
//! background error from the pool flags it as errored and schedules a
//! teardown; the next caller transparently opens a fresh one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use dealbridge_core::erp::{ErpSession, ErpSessionSource};
use dealbridge_core::settings::service::ConnectionTarget;
use dealbridge_core::ConnectionSettingsService;
use dealbridge_domain::{ConnectionSettings, DealBridgeError, ErpConfig, PoolState, Result};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::pool::{ErpConnector, ErpPool, PoolErrorListener};

struct LivePool {
    pool: Arc<dyn ErpPool>,
    generation: u64,
}

struct Shared {
    slot: Mutex<Option<LivePool>>,
    errored: AtomicBool,
    next_generation: AtomicU64,
    /// Generation of the pool currently in the slot, 0 when empty.
    live_generation: AtomicU64,
    state: parking_lot::Mutex<PoolState>,
}

impl Shared {
    fn set_state(&self, state: PoolState) {
        *self.state.lock() = state;
    }

    /// Called from bb8's error sink; must not block.
    fn on_pool_error(self: Arc<Self>, generation: u64, message: String) {
        if self.live_generation.load(Ordering::SeqCst) != generation {
            debug!(generation, %message, "ignoring error from a retired ERP pool");
            return;
        }
        warn!(generation, error = %message, "ERP pool reported an error; scheduling teardown");
        if self.errored.swap(true, Ordering::SeqCst) {
            return;
        }
        self.set_state(PoolState::Errored);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { self.teardown(generation).await });
            }
            Err(_) => debug!("no runtime available; pool will be replaced on next use"),
        }
    }

    /// Closes the pool of `generation` if it is still the live one.
    async fn teardown(&self, generation: u64) {
        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(|live| live.generation == generation) {
            if let Some(live) = slot.take() {
                live.pool.close().await;
            }
            self.retire();
            info!(generation, "ERP pool torn down");
        }
    }

    fn retire(&self) {
        self.live_generation.store(0, Ordering::SeqCst);
        self.errored.store(false, Ordering::SeqCst);
        self.set_state(PoolState::Absent);
    }
}

/// Owner of the shared ERP pool
pub struct ErpPoolManager {
    connector: Arc<dyn ErpConnector>,
    settings: Arc<ConnectionSettingsService>,
    config: ErpConfig,
    shared: Arc<Shared>,
}

impl ErpPoolManager {
    pub fn new(
        connector: Arc<dyn ErpConnector>,
        settings: Arc<ConnectionSettingsService>,
        config: ErpConfig,
    ) -> Self {
        Self {
            connector,
            settings,
            config,
            shared: Arc::new(Shared {
                slot: Mutex::new(None),
                errored: AtomicBool::new(false),
                next_generation: AtomicU64::new(0),
                live_generation: AtomicU64::new(0),
                state: parking_lot::Mutex::new(PoolState::Absent),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PoolState {
        *self.shared.state.lock()
    }

    /// Returns the live pool, opening one from the stored settings when none
    /// is usable.
    ///
    /// # Errors
    /// `Config` when settings or password are missing (no network attempt),
    /// `Connection` when the handshake fails.
    pub async fn get_pool(&self) -> Result<Arc<dyn ErpPool>> {
        let mut slot = self.shared.slot.lock().await;

        if let Some(live) = slot.as_ref() {
            if !self.shared.errored.load(Ordering::SeqCst) && live.pool.is_connected() {
                return Ok(Arc::clone(&live.pool));
            }
        }
        if let Some(stale) = slot.take() {
            debug!(generation = stale.generation, "replacing unusable ERP pool");
            stale.pool.close().await;
            self.shared.retire();
        }

        let target = self.settings.load_target().await?;
        self.shared.set_state(PoolState::Connecting);

        let generation = self.shared.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let listener = self.listener(generation);
        match self.connector.open(&target, &self.config.live_limits(), listener).await {
            Ok(pool) => {
                *slot = Some(LivePool { pool: Arc::clone(&pool), generation });
                self.shared.live_generation.store(generation, Ordering::SeqCst);
                self.shared.set_state(PoolState::Connected);
                info!(generation, target = %target.settings.identity, "ERP pool connected");
                Ok(pool)
            }
            Err(err) => {
                self.shared.set_state(PoolState::Absent);
                warn!(error = %err, "failed to open ERP pool");
                Err(err)
            }
        }
    }

    /// Opens an isolated, short-lived pool to check the given settings.
    ///
    /// Without a password (or with an empty one) the stored password for the
    /// same identity is used. The shared pool is never touched.
    ///
    /// # Errors
    /// `Config` when fields or the password are missing, `Connection` with
    /// the transport message when the server cannot be reached.
    #[instrument(skip(self, settings, password), fields(target = %settings.identity))]
    pub async fn test_connection(
        &self,
        settings: &ConnectionSettings,
        password: Option<String>,
    ) -> Result<bool> {
        let missing = settings.identity.missing_fields();
        if !missing.is_empty() {
            return Err(DealBridgeError::Config(format!(
                "missing connection settings: {}",
                missing.join(", ")
            )));
        }

        let password = match password.filter(|p| !p.is_empty()) {
            Some(password) => password,
            None => self.settings.password_for(&settings.identity)?.ok_or_else(|| {
                DealBridgeError::Config(format!(
                    "no password given and none stored for {}",
                    settings.identity
                ))
            })?,
        };

        let target = ConnectionTarget { settings: settings.clone(), password };
        let listener: PoolErrorListener = Arc::new(|message: String| {
            debug!(error = %message, "connection test pool error");
        });
        let pool = self.connector.open(&target, &self.config.test_limits(), listener).await?;
        pool.close().await;
        info!("ERP connection test succeeded");
        Ok(true)
    }

    /// Closes the shared pool. Safe to call when none exists.
    pub async fn close_pool(&self) {
        let mut slot = self.shared.slot.lock().await;
        if let Some(live) = slot.take() {
            live.pool.close().await;
            info!(generation = live.generation, "ERP pool closed");
        }
        self.shared.retire();
    }

    fn listener(&self, generation: u64) -> PoolErrorListener {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        Arc::new(move |message: String| {
            if let Some(shared) = shared.upgrade() {
                shared.on_pool_error(generation, message);
            }
        })
    }
}

#[async_trait]
impl ErpSessionSource for ErpPoolManager {
    async fn acquire(&self) -> Result<Box<dyn ErpSession>> {
        let pool = self.get_pool().await?;
        match pool.session().await {
            Ok(session) => Ok(session),
            Err(err) => {
                if err.is_connectivity() {
                    warn!(error = %err, "ERP checkout failed; closing pool");
                    self.close_pool().await;
                }
                Err(err)
            }
        }
    }

    async fn report_failure(&self, error: &DealBridgeError) {
        if error.is_connectivity() {
            warn!(error = %error, "connectivity failure; closing ERP pool");
            self.close_pool().await;
        }
    }
}
