//! ERP (SQL Server) access
//!
//! - [`connection`]: bb8 connection manager speaking TDS through tiberius
//! - [`session`]: one checked-out connection implementing the core session port
//! - [`pool`]: pool and connector seams so the manager can be tested offline
//! - [`manager`]: the process-wide pool with single-flight creation and
//!   self-healing teardown

pub mod connection;
pub mod error;
pub mod manager;
pub mod pool;
pub mod session;

pub use connection::{TdsConnection, TdsConnectionManager};
pub use error::TdsError;
pub use manager::ErpPoolManager;
pub use pool::{ErpConnector, ErpPool, PoolErrorListener, TdsConnector, TdsPool};
pub use session::TiberiusSession;
