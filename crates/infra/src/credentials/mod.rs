//! Credential vault backed by the OS keychain

pub mod keyring_vault;

pub use keyring_vault::KeyringCredentialVault;
