//! Testing utilities and helpers
//!
//! - **[`mocks`]**: in-memory implementations of platform services
//!
//! ## Usage
//!
//! ```rust
//! use dealbridge_common::security::SecretStore;
//! use dealbridge_common::testing::MockKeychainProvider;
//!
//! let keychain = MockKeychainProvider::new("DealBridgeTest");
//! keychain.set_secret("account", "secret").unwrap();
//! assert!(keychain.secret_exists("account"));
//! ```

pub mod mocks;

pub use mocks::MockKeychainProvider;
