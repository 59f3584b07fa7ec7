//! Reference data synchronization service - core business logic

use std::sync::Arc;

use dealbridge_domain::{ReferenceEntity, ReferenceKind, ReferenceSyncReport, Result};
use tracing::{info, instrument, warn};

use super::ports::ReferenceCache;
use super::queries::fetch_statement;
use crate::erp::ErpSessionSource;

/// Mirrors ERP lookup tables into the local caches
pub struct ReferenceSyncService {
    erp: Arc<dyn ErpSessionSource>,
    cache: Arc<dyn ReferenceCache>,
}

impl ReferenceSyncService {
    pub fn new(erp: Arc<dyn ErpSessionSource>, cache: Arc<dyn ReferenceCache>) -> Self {
        Self { erp, cache }
    }

    /// Reads every active row of one lookup table from the ERP.
    ///
    /// Rows without an id are skipped; a missing name becomes empty.
    pub async fn fetch_all(&self, kind: ReferenceKind) -> Result<Vec<ReferenceEntity>> {
        let mut session = match self.erp.acquire().await {
            Ok(session) => session,
            Err(err) => {
                self.erp.report_failure(&err).await;
                return Err(err);
            }
        };

        let rows = match session.query(&fetch_statement(kind)).await {
            Ok(rows) => rows,
            Err(err) => {
                self.erp.report_failure(&err).await;
                return Err(err);
            }
        };

        Ok(rows
            .iter()
            .filter_map(|row| {
                let erp_id = row.get_i32(0)?;
                let name = row.get_str(1).unwrap_or_default().trim().to_string();
                Some(ReferenceEntity { erp_id, name })
            })
            .collect())
    }

    pub async fn upsert_all(
        &self,
        kind: ReferenceKind,
        entities: &[ReferenceEntity],
    ) -> Result<usize> {
        self.cache.upsert_all(kind, entities).await
    }

    /// Fetches one kind and upserts it, returning the number of rows written.
    #[instrument(skip(self))]
    pub async fn sync_kind(&self, kind: ReferenceKind) -> Result<usize> {
        let entities = self.fetch_all(kind).await?;
        let synced = self.upsert_all(kind, &entities).await?;
        info!(%kind, synced, "reference data synchronized");
        Ok(synced)
    }

    /// Synchronizes every kind independently. A failing kind is reported and
    /// does not stop the others.
    pub async fn sync_all(&self) -> Vec<ReferenceSyncReport> {
        let mut reports = Vec::with_capacity(ReferenceKind::ALL.len());
        for kind in ReferenceKind::ALL {
            let report = match self.sync_kind(kind).await {
                Ok(synced) => ReferenceSyncReport::succeeded(kind, synced),
                Err(err) => {
                    warn!(%kind, error = %err, "reference data sync failed");
                    ReferenceSyncReport::failed(kind, err.to_string())
                }
            };
            reports.push(report);
        }
        reports
    }

    /// Cached rows for pickers.
    pub async fn list(&self, kind: ReferenceKind) -> Result<Vec<ReferenceEntity>> {
        self.cache.list(kind).await
    }
}
