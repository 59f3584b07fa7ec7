//! ERP reference (lookup) data cached locally

use serde::{Deserialize, Serialize};

use crate::impl_domain_enum_conversions;

/// The four lookup tables mirrored from the ERP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    LegalEntity,
    Warehouse,
    PaymentMethod,
    ShippingMethod,
}

impl_domain_enum_conversions!(ReferenceKind {
    LegalEntity => "legal_entity",
    Warehouse => "warehouse",
    PaymentMethod => "payment_method",
    ShippingMethod => "shipping_method",
});

impl ReferenceKind {
    /// All kinds, in synchronization order.
    pub const ALL: [Self; 4] =
        [Self::LegalEntity, Self::Warehouse, Self::PaymentMethod, Self::ShippingMethod];
}

/// One row of an ERP lookup table. `erp_id` is the ERP primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntity {
    pub erp_id: i32,
    pub name: String,
}

impl ReferenceEntity {
    pub fn new(erp_id: i32, name: impl Into<String>) -> Self {
        Self { erp_id, name: name.into() }
    }
}

/// Per-kind outcome of a synchronization run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSyncReport {
    pub kind: ReferenceKind,
    pub synced: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReferenceSyncReport {
    #[must_use]
    pub const fn succeeded(kind: ReferenceKind, synced: usize) -> Self {
        Self { kind, synced, error: None }
    }

    pub fn failed(kind: ReferenceKind, error: impl Into<String>) -> Self {
        Self { kind, synced: 0, error: Some(error.into()) }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
