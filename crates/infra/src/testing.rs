//! In-memory ERP connector for pool manager and application tests
//!
//! [`FakeConnector`] opens [`FakePool`]s whose sessions come from a shared
//! [`FakeErp`]. Every open is recorded and each pool keeps its error
//! listener so tests can simulate background pool failures.

#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dealbridge_core::erp::{ErpSession, ErpSessionSource};
use dealbridge_core::settings::service::ConnectionTarget;
use dealbridge_core::testing::FakeErp;
use dealbridge_domain::{DealBridgeError, PoolLimits, Result};
use parking_lot::Mutex;

use crate::erp::{ErpConnector, ErpPool, PoolErrorListener};

/// Pool double handing out [`FakeErp`] sessions
pub struct FakePool {
    erp: FakeErp,
    closed: AtomicBool,
    listener: PoolErrorListener,
}

impl FakePool {
    /// Fire the listener as bb8's error sink would.
    pub fn emit_error(&self, message: &str) {
        (self.listener)(message.to_string());
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ErpPool for FakePool {
    fn is_connected(&self) -> bool {
        !self.is_closed()
    }

    async fn session(&self) -> Result<Box<dyn ErpSession>> {
        self.erp.acquire().await
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// One recorded [`ErpConnector::open`] call
#[derive(Clone)]
pub struct OpenedPool {
    pub password: String,
    pub limits: PoolLimits,
    pub pool: Arc<FakePool>,
}

/// Connector double; clones share the recorded opens
#[derive(Clone, Default)]
pub struct FakeConnector {
    erp: FakeErp,
    opened: Arc<Mutex<Vec<OpenedPool>>>,
    fail_next: Arc<Mutex<Option<DealBridgeError>>>,
    delay: Option<Duration>,
}

impl FakeConnector {
    pub fn new(erp: FakeErp) -> Self {
        Self { erp, ..Self::default() }
    }

    /// Slow every open down, widening the window for concurrent callers.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn erp(&self) -> &FakeErp {
        &self.erp
    }

    /// Make the next open fail with `error`.
    pub fn fail_next(&self, error: DealBridgeError) {
        *self.fail_next.lock() = Some(error);
    }

    #[must_use]
    pub fn opens(&self) -> usize {
        self.opened.lock().len()
    }

    #[must_use]
    pub fn opened(&self) -> Vec<OpenedPool> {
        self.opened.lock().clone()
    }

    #[must_use]
    pub fn pool(&self, index: usize) -> Arc<FakePool> {
        Arc::clone(&self.opened.lock()[index].pool)
    }
}

#[async_trait]
impl ErpConnector for FakeConnector {
    async fn open(
        &self,
        target: &ConnectionTarget,
        limits: &PoolLimits,
        listener: PoolErrorListener,
    ) -> Result<Arc<dyn ErpPool>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.fail_next.lock().take() {
            return Err(error);
        }
        let pool =
            Arc::new(FakePool { erp: self.erp.clone(), closed: AtomicBool::new(false), listener });
        self.opened.lock().push(OpenedPool {
            password: target.password.clone(),
            limits: limits.clone(),
            pool: Arc::clone(&pool),
        });
        Ok(pool)
    }
}
