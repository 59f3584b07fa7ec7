//! # DealBridge Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - ERP access over TDS (tiberius connections pooled by bb8)
//! - The shared ERP pool manager with self-healing teardown
//! - Local SQLite store (settings, customers, reference caches)
//! - OS keychain credential vault
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `dealbridge-core`
//! - Contains all "impure" code (network, disk, platform keychain)

pub mod config;
pub mod credentials;
pub mod database;
pub mod erp;
pub mod errors;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used items
pub use credentials::KeyringCredentialVault;
pub use database::{
    LocalDbManager, SqliteCustomerDirectory, SqliteReferenceCache, SqliteSettingsStore,
};
pub use erp::{ErpConnector, ErpPool, ErpPoolManager, TdsConnector};
pub use errors::InfraError;
