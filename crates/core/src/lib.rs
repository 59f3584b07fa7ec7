//! # DealBridge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the ERP database, the local store,
//!   the settings store and the credential vault
//! - Services: connection settings, reference data sync, order placement
//!
//! ## Architecture Principles
//! - Only depends on `dealbridge-domain`
//! - No database, network, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod erp;
pub mod orders;
pub mod reference;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use erp::ports::{ErpSession, ErpSessionSource, SqlRow, SqlValue, Statement, StatementKind};
pub use orders::ports::CustomerDirectory;
pub use orders::{OrderDefaults, OrderScript, OrderService};
pub use reference::ports::ReferenceCache;
pub use reference::ReferenceSyncService;
pub use settings::ports::{CredentialVault, SettingsStore};
pub use settings::ConnectionSettingsService;
