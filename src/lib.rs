//! Library root for `triage-sync`.
//!
//! Triage-sync runs two independent decision engines over a shared record store:
//! - The ticket triage engine classifies support tickets, checks response-time
//!   SLAs, escalates criticals, and substitutes a fallback whenever the
//!   upstream support channel fails
//! - The inventory reconciliation engine applies stock reports from store
//!   locations, bounds sync latency, and pushes records downstream with a
//!   capped retry loop
//!
//! Records live in SurrealDB (in-memory or remote). The support channel, the
//! sync target, and the clock sit behind traits so each can be swapped out
//! or mocked.

#[deny(missing_docs)]
pub mod base;
pub mod engine;
pub mod interaction;
pub mod prelude;
pub mod runtime;
pub mod service;

use std::path::Path;

use base::{
    config::Config,
    types::{Res, StockReport, TicketIntake},
};
use runtime::{InventoryBatchReport, Runtime, TicketBatchReport};
use serde::de::DeserializeOwned;
use tracing::info;

/// Triages every ticket intake in the JSON file at `path`.
pub async fn run_tickets(config: Config, path: &Path) -> Res<TicketBatchReport> {
    info!("Starting ticket triage ...");

    let intakes: Vec<TicketIntake> = read_json(path).await?;
    let runtime = Runtime::new(config).await?;

    runtime.ingest_tickets(intakes).await
}

/// Reconciles every stock report in the JSON file at `path`.
///
/// Ctrl-C stops pending sync retries between attempts.
pub async fn run_inventory(config: Config, path: &Path) -> Res<InventoryBatchReport> {
    info!("Starting inventory reconciliation ...");

    let reports: Vec<StockReport> = read_json(path).await?;
    let runtime = Runtime::new(config).await?;

    let shutdown = runtime.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted; cancelling pending sync retries ...");
            shutdown.cancel();
        }
    });

    runtime.ingest_stock_reports(reports).await
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Res<T> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| anyhow::anyhow!("Failed to read `{}`: {e}", path.display()))?;

    Ok(serde_json::from_str(&raw)?)
}
