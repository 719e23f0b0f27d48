//! This module handles entries of the inventory source feed.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::{
    base::{
        error::{ReconcileError, ReconcileResult},
        types::{InventoryRecord, StockReport},
    },
    engine::reconcile::{ReconciliationEngine, SyncResult},
    service::store::StoreClient,
};

/// What happened to a record for one stock report.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ReconcileOutcome {
    /// The record was already up to date and synced (replay or stale report).
    Unchanged { record: InventoryRecord },
    /// The record was updated and pushed downstream.
    Synced { record: InventoryRecord, attempt: u32 },
}

impl ReconcileOutcome {
    pub fn record(&self) -> &InventoryRecord {
        match self {
            ReconcileOutcome::Unchanged { record } | ReconcileOutcome::Synced { record, .. } => record,
        }
    }
}

/// Handles a stock report.
///
/// Runs under the record's lock: loads or creates the record, applies the
/// delta, stores it, and pushes it through the retry loop. On success the
/// sync timestamp is stored too. Invalid quantities are rejected before the
/// store is touched; exhausted or cancelled syncs leave the new quantity stored
/// with `pending_sync` set, so a redelivery of the same report retries the push.
#[instrument(skip_all, fields(record = %report.id))]
pub async fn handle_stock_report(report: &StockReport, store: &StoreClient, engine: &ReconciliationEngine, cancel: &CancellationToken) -> ReconcileResult<ReconcileOutcome> {
    let _guard = store.locks().lock(&report.id).await;

    // First, get the record from the store; or, create it from this report.

    let record = match store.get_inventory(&report.id).await? {
        Some(existing) => engine.apply_delta(&existing, report.quantity, report.observed_at)?,
        None => {
            let quantity = u64::try_from(report.quantity).map_err(|_| ReconcileError::InvalidQuantity {
                id: report.id.clone(),
                quantity: report.quantity,
            })?;

            info!("Inventory record `{}` not found, creating it.", report.id);

            InventoryRecord::new(report.id.as_str(), report.store.as_str(), quantity, report.observed_at)
        }
    };

    if !record.pending_sync {
        debug!("Inventory record `{}` already in sync.", record.id);
        return Ok(ReconcileOutcome::Unchanged { record });
    }

    store.put_inventory(&record).await?;

    // Push downstream.

    match engine.sync(&record, cancel).await {
        SyncResult::Succeeded { attempt } => {
            let record = engine.mark_synced(&record);
            store.put_inventory(&record).await?;

            Ok(ReconcileOutcome::Synced { record, attempt })
        }
        SyncResult::Exhausted { attempts } => {
            let err = ReconcileError::SyncExhausted { id: record.id.clone(), attempts };
            error!("{}", err);

            Err(err)
        }
        SyncResult::Cancelled { attempts } => Err(ReconcileError::SyncCancelled { id: record.id.clone(), attempts }),
    }
}
