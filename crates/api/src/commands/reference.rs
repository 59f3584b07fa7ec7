//! ERP reference data commands

use std::time::Instant;

use dealbridge_domain::{DealBridgeError, ReferenceEntity, ReferenceKind, ReferenceSyncReport};

use crate::utils::command_helpers::execute_logged;
use crate::utils::logging::log_command_execution;
use crate::AppContext;

/// Mirrors every lookup table; one report per kind.
pub async fn sync_reference_data(ctx: &AppContext) -> Vec<ReferenceSyncReport> {
    let start = Instant::now();
    let reports = ctx.reference_sync.sync_all().await;
    let success = reports.iter().all(ReferenceSyncReport::is_success);
    log_command_execution("reference::sync_reference_data", start.elapsed(), success);
    reports
}

/// Cached rows of one kind (`legal_entity`, `warehouse`, `payment_method`,
/// `shipping_method`) for pickers.
pub async fn list_reference_data(
    ctx: &AppContext,
    kind: &str,
) -> Result<Vec<ReferenceEntity>, String> {
    execute_logged("reference::list_reference_data", || async move {
        let kind: ReferenceKind = kind.parse().map_err(DealBridgeError::InvalidInput)?;
        ctx.reference_sync.list(kind).await
    })
    .await
    .map_err(|e| format!("Failed to list {kind} entries: {e}"))
}
