//! Pool and connector seams
//!
//! [`ErpConnector`] opens an [`ErpPool`] for a connection target. The
//! production pair is [`TdsConnector`]/[`TdsPool`] (bb8 over tiberius); the
//! pool manager only sees the traits.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dealbridge_core::erp::{ErpSession, Statement, StatementKind};
use dealbridge_core::settings::service::ConnectionTarget;
use dealbridge_domain::{DealBridgeError, PoolLimits, Result};
use tracing::{debug, info};

use super::connection::TdsConnectionManager;
use super::error::TdsError;
use super::session::TiberiusSession;
use crate::errors::InfraError;

/// Callback invoked with the message of every background pool error
pub type PoolErrorListener = Arc<dyn Fn(String) + Send + Sync>;

/// A live connection pool against one ERP database
#[async_trait]
pub trait ErpPool: Send + Sync {
    /// False once the pool has been closed.
    fn is_connected(&self) -> bool;

    /// Checks out one connection as a session.
    async fn session(&self) -> Result<Box<dyn ErpSession>>;

    /// Round trip that proves the server answers queries.
    async fn ping(&self) -> Result<()> {
        let mut session = self.session().await?;
        let rows = session.query(&Statement::new(StatementKind::Probe, "SELECT 1")).await?;
        match rows.first().and_then(|row| row.get_i32(0)) {
            Some(1) => Ok(()),
            _ => Err(DealBridgeError::Connection("ERP probe returned an unexpected result".into())),
        }
    }

    /// Stops handing out sessions. Connections close once released.
    async fn close(&self);
}

/// Opens pools; the listener receives errors raised after creation
#[async_trait]
pub trait ErpConnector: Send + Sync {
    async fn open(
        &self,
        target: &ConnectionTarget,
        limits: &PoolLimits,
        listener: PoolErrorListener,
    ) -> Result<Arc<dyn ErpPool>>;
}

/// bb8 pool of tiberius connections
pub struct TdsPool {
    pool: bb8::Pool<TdsConnectionManager>,
    request_timeout: Duration,
    closed: AtomicBool,
}

#[async_trait]
impl ErpPool for TdsPool {
    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    async fn session(&self) -> Result<Box<dyn ErpSession>> {
        if !self.is_connected() {
            return Err(DealBridgeError::Connection("ERP pool is closed".into()));
        }
        let conn = self.pool.get_owned().await.map_err(InfraError::from)?;
        Ok(Box::new(TiberiusSession::new(conn, self.request_timeout)))
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let state = self.pool.state();
            debug!(
                connections = state.connections,
                idle = state.idle_connections,
                "closing ERP pool"
            );
        }
    }
}

/// Forwards bb8's background errors to the manager
struct ListenerSink {
    listener: PoolErrorListener,
}

impl fmt::Debug for ListenerSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSink").finish_non_exhaustive()
    }
}

impl bb8::ErrorSink<TdsError> for ListenerSink {
    fn sink(&self, error: TdsError) {
        (self.listener)(error.to_string());
    }

    fn boxed_clone(&self) -> Box<dyn bb8::ErrorSink<TdsError>> {
        Box::new(Self { listener: Arc::clone(&self.listener) })
    }
}

/// Production connector: builds a [`TdsPool`] and verifies the handshake
#[derive(Debug, Default, Clone, Copy)]
pub struct TdsConnector;

#[async_trait]
impl ErpConnector for TdsConnector {
    async fn open(
        &self,
        target: &ConnectionTarget,
        limits: &PoolLimits,
        listener: PoolErrorListener,
    ) -> Result<Arc<dyn ErpPool>> {
        let manager = TdsConnectionManager::new(target, limits);
        let pool = bb8::Pool::builder()
            .max_size(limits.max_size)
            .connection_timeout(limits.connect_timeout)
            .retry_connection(false)
            .error_sink(Box::new(ListenerSink { listener }))
            .build(manager)
            .await
            .map_err(InfraError::from)?;

        let pool = TdsPool {
            pool,
            request_timeout: limits.request_timeout,
            closed: AtomicBool::new(false),
        };
        // bb8 connects lazily; fail here rather than on the first order.
        pool.ping().await?;
        info!(target = %target.settings.identity, max_size = limits.max_size, "ERP pool opened");
        Ok(Arc::new(pool))
    }
}
