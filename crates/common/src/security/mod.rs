//! Security primitives and utilities
//!
//! Generic secret storage that can be used across domains. Domain-specific
//! credential handling (ERP passwords keyed by connection identity) is built
//! on top of [`SecretStore`] in the infrastructure crate.

pub mod keychain;

#[cfg(feature = "platform")]
pub use keychain::KeychainProvider;
pub use keychain::{KeychainError, SecretStore};
