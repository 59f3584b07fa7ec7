//! Domain types and models

pub mod connection;
pub mod customer;
pub mod order;
pub mod reference;

pub use connection::{ConnectionIdentity, ConnectionSettings, PasswordUpdate, PoolState};
pub use customer::Customer;
pub use order::{
    ArticleListEntry, OrderInput, OrderLineInput, OrderResult, OrderStage, ResolvedArticle,
};
pub use reference::{ReferenceEntity, ReferenceKind, ReferenceSyncReport};

/// Outcome of a settings/credential command, shaped for the UI caller
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}
