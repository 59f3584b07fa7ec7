//! Local SQLite store implementations

pub mod customer_repository;
pub mod manager;
pub mod reference_repository;
pub mod settings_repository;

pub use customer_repository::SqliteCustomerDirectory;
pub use manager::{LocalDbManager, SqliteConnection, SqlitePool};
pub use reference_repository::SqliteReferenceCache;
pub use settings_repository::SqliteSettingsStore;
