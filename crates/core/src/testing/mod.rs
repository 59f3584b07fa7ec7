//! In-memory implementations of every core port
//!
//! Enabled with the `test-utils` feature; always compiled for this crate's
//! own unit tests.
//!
//! - [`FakeErp`]: ERP double that stages writes per transaction and counts
//!   session acquisitions
//! - [`InMemoryCustomerDirectory`], [`InMemorySettingsStore`],
//!   [`InMemoryVault`], [`InMemoryReferenceCache`]: local collaborators

pub mod erp;
pub mod stores;

pub use erp::{FakeAddress, FakeArticle, FakeErp, FakeOrder, FakePosition};
pub use stores::{
    InMemoryCustomerDirectory, InMemoryReferenceCache, InMemorySettingsStore, InMemoryVault,
};
