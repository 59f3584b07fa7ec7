//! SQLite-backed caches of ERP lookup tables.

use std::sync::Arc;

use async_trait::async_trait;
use dealbridge_core::ReferenceCache;
use dealbridge_domain::{ReferenceEntity, ReferenceKind, Result as DomainResult};
use rusqlite::{params, Connection};
use tokio::task;
use tracing::debug;

use super::manager::{map_join_error, map_sql_error, LocalDbManager};

/// One table per [`ReferenceKind`], keyed by `erp_id`
pub struct SqliteReferenceCache {
    db: Arc<LocalDbManager>,
}

impl SqliteReferenceCache {
    pub fn new(db: Arc<LocalDbManager>) -> Self {
        Self { db }
    }
}

const fn table_name(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::LegalEntity => "erp_legal_entities",
        ReferenceKind::Warehouse => "erp_warehouses",
        ReferenceKind::PaymentMethod => "erp_payment_methods",
        ReferenceKind::ShippingMethod => "erp_shipping_methods",
    }
}

#[async_trait]
impl ReferenceCache for SqliteReferenceCache {
    async fn upsert_all(
        &self,
        kind: ReferenceKind,
        entities: &[ReferenceEntity],
    ) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);
        let entities = entities.to_vec();

        task::spawn_blocking(move || -> DomainResult<usize> {
            let mut conn = db.get_connection()?;
            let written = upsert_entities(&mut conn, kind, &entities).map_err(map_sql_error)?;
            debug!(%kind, written, "reference cache updated");
            Ok(written)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self, kind: ReferenceKind) -> DomainResult<Vec<ReferenceEntity>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<ReferenceEntity>> {
            let conn = db.get_connection()?;
            query_entities(&conn, kind).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

/// Upserts every entity in one transaction. Rows missing from `entities`
/// are left in place.
fn upsert_entities(
    conn: &mut Connection,
    kind: ReferenceKind,
    entities: &[ReferenceEntity],
) -> rusqlite::Result<usize> {
    let now = chrono::Utc::now().timestamp();
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} (erp_id, name, synced_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(erp_id) DO UPDATE SET
                name = excluded.name,
                synced_at = excluded.synced_at",
            table_name(kind)
        ))?;
        for entity in entities {
            stmt.execute(params![entity.erp_id, entity.name, now])?;
        }
    }
    tx.commit()?;
    Ok(entities.len())
}

fn query_entities(conn: &Connection, kind: ReferenceKind) -> rusqlite::Result<Vec<ReferenceEntity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT erp_id, name FROM {} ORDER BY name, erp_id",
        table_name(kind)
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(ReferenceEntity { erp_id: row.get(0)?, name: row.get(1)? })
    })?;
    rows.collect()
}
