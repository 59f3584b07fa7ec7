//! Common utilities shared across DealBridge crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `platform`: OS keychain integration (`keyring`)
//! - `test-utils`: in-memory doubles for platform services

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use security::{KeychainError, SecretStore};
#[cfg(feature = "platform")]
pub use security::KeychainProvider;
