//! Port interfaces for the local reference data caches

use async_trait::async_trait;
use dealbridge_domain::{ReferenceEntity, ReferenceKind, Result};

/// Local cache tables for ERP lookup data, one table per kind
#[async_trait]
pub trait ReferenceCache: Send + Sync {
    /// Inserts by `erp_id` and overwrites the name on conflict. Rows absent
    /// from `entities` are left untouched.
    async fn upsert_all(&self, kind: ReferenceKind, entities: &[ReferenceEntity]) -> Result<usize>;

    /// Cached rows ordered by name.
    async fn list(&self, kind: ReferenceKind) -> Result<Vec<ReferenceEntity>>;
}
