//! Runtime services and shared state for triage-sync.

use std::collections::BTreeMap;

use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::{
    base::{
        config::Config,
        error::ReconcileError,
        types::{ComplianceReport, InventoryRecord, PriorityTag, Res, StockReport, Ticket, TicketIntake},
    },
    engine::{
        reconcile::ReconciliationEngine,
        triage::{BatchClass, TriageEngine},
    },
    interaction::{
        stock_report::{ReconcileOutcome, handle_stock_report},
        ticket_intake::{IntakeOutcome, handle_ticket_intake},
    },
    service::{clock::Clock, store::StoreClient, support::SupportClient, sync::SyncClient},
};

// Reports.

/// Summary of a ticket batch.
#[derive(Debug, Clone, Serialize)]
pub struct TicketBatchReport {
    /// One outcome per intake, in input order.
    pub outcomes: Vec<IntakeOutcome>,
    /// Distinct escalated tickets.
    pub escalated: usize,
    pub fallbacks: usize,
    /// Compliance of the distinct critical tickets in the batch.
    pub critical: ComplianceReport,
    /// Compliance of the distinct medium and low tickets in the batch.
    pub general: ComplianceReport,
}

/// A stock report that could not be reconciled.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileFailure {
    pub id: String,
    pub error: String,
}

/// Summary of an inventory batch.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryBatchReport {
    pub synced: usize,
    pub unchanged: usize,
    /// Reports rejected for an invalid quantity.
    pub rejected: Vec<ReconcileFailure>,
    /// Records whose sync exhausted its attempts; these need an operator.
    pub exhausted: Vec<ReconcileFailure>,
    pub cancelled: Vec<ReconcileFailure>,
    /// Records within the realtime latency bound.
    pub within_realtime_bound: usize,
    /// Bulk compliance of every record touched by the batch.
    pub bulk: ComplianceReport,
    /// Wall time of the whole batch, in seconds.
    pub elapsed_secs: i64,
    /// Whether the batch finished inside the bulk sync window.
    pub within_bulk_window: bool,
}

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configuration, the record store, and both engines.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The record store instance.
    pub store: StoreClient,
    /// The ticket triage engine.
    pub triage: TriageEngine,
    /// The inventory reconciliation engine.
    pub reconcile: ReconciliationEngine,
    /// Cancels in-flight sync retry loops between attempts.
    pub shutdown: CancellationToken,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the record store.
        let store = StoreClient::surreal(&config).await?;

        // Initialize the upstream clients.
        let support = SupportClient::from_config(&config)?;
        let sync = SyncClient::from_config(&config)?;

        Ok(Self::with_services(config, store, support, sync, Clock::system()))
    }

    /// Create a runtime from already-constructed services.
    pub fn with_services(config: Config, store: StoreClient, support: SupportClient, sync: SyncClient, clock: Clock) -> Self {
        let triage = TriageEngine::new(&config, support);
        let reconcile = ReconciliationEngine::new(&config, sync, clock);

        Self {
            config,
            store,
            triage,
            reconcile,
            shutdown: CancellationToken::new(),
        }
    }

    /// Processes a batch of ticket intakes.
    ///
    /// Tickets are handled concurrently; intakes for the same ticket are
    /// serialized by the store's locks.
    #[instrument(skip_all, fields(count = intakes.len()))]
    pub async fn ingest_tickets(&self, intakes: Vec<TicketIntake>) -> Res<TicketBatchReport> {
        let results = join_all(intakes.into_iter().map(|intake| async move { handle_ticket_intake(intake, &self.store, &self.triage).await })).await;
        let outcomes = results.into_iter().collect::<Res<Vec<_>>>()?;

        // Count each ticket once, using its state after the last intake.
        let tickets = outcomes.iter().map(|o| (o.ticket.id.as_str(), &o.ticket)).collect::<BTreeMap<_, _>>();
        let escalated = tickets.values().filter(|t| t.escalated).count();
        let (critical, general): (Vec<Ticket>, Vec<Ticket>) = tickets.into_values().cloned().partition(|t| t.priority == Some(PriorityTag::Critical));

        let report = TicketBatchReport {
            escalated,
            fallbacks: outcomes.iter().filter(|o| o.support.as_ref().is_some_and(|s| s.is_fallback())).count(),
            critical: self.triage.compliance_report(&critical, BatchClass::Critical),
            general: self.triage.compliance_report(&general, BatchClass::General),
            outcomes,
        };

        info!(
            "Processed {} tickets: {} escalated, {} fallbacks, critical compliance {:.2}, general compliance {:.2}.",
            report.outcomes.len(),
            report.escalated,
            report.fallbacks,
            report.critical.rate,
            report.general.rate
        );

        if !report.critical.meets_target || !report.general.meets_target {
            warn!("Ticket batch is below its compliance target.");
        }

        Ok(report)
    }

    /// Processes a batch of stock reports.
    ///
    /// Invalid, exhausted, and cancelled reports are collected into the report.
    /// Only record store failures abort the batch.
    #[instrument(skip_all, fields(count = reports.len()))]
    pub async fn ingest_stock_reports(&self, reports: Vec<StockReport>) -> Res<InventoryBatchReport> {
        let started_at = self.reconcile.clock().now();

        let results = join_all(reports.iter().map(|report| async move { (report, handle_stock_report(report, &self.store, &self.reconcile, &self.shutdown).await) })).await;

        let mut synced = 0;
        let mut unchanged = 0;
        let mut rejected = Vec::new();
        let mut exhausted = Vec::new();
        let mut cancelled = Vec::new();
        let mut touched: Vec<InventoryRecord> = Vec::new();

        for (report, result) in results {
            let failure = |err: &ReconcileError| ReconcileFailure {
                id: report.id.clone(),
                error: err.to_string(),
            };

            match result {
                Ok(outcome) => {
                    match &outcome {
                        ReconcileOutcome::Synced { .. } => synced += 1,
                        ReconcileOutcome::Unchanged { .. } => unchanged += 1,
                    }
                    touched.push(outcome.record().clone());
                }
                Err(err @ ReconcileError::InvalidQuantity { .. }) => rejected.push(failure(&err)),
                Err(err @ ReconcileError::SyncExhausted { .. }) => exhausted.push(failure(&err)),
                Err(err @ ReconcileError::SyncCancelled { .. }) => cancelled.push(failure(&err)),
                Err(err) => return Err(err.into()),
            }
        }

        // Count each record once, using its latest state.
        touched.sort_by(|a, b| a.id.cmp(&b.id).then(b.last_observed_at.cmp(&a.last_observed_at)));
        touched.dedup_by(|a, b| a.id == b.id);

        let elapsed = self.reconcile.clock().now() - started_at;
        let elapsed_secs = elapsed.num_seconds();

        let report = InventoryBatchReport {
            synced,
            unchanged,
            within_realtime_bound: touched.iter().filter(|r| self.reconcile.is_within_realtime_bound(r)).count(),
            bulk: self.reconcile.bulk_report(&touched),
            within_bulk_window: elapsed.to_std().map_or(true, |e| e <= self.config.bulk_sync_window),
            elapsed_secs,
            rejected,
            exhausted,
            cancelled,
        };

        info!(
            "Processed {} stock reports in {}s: {} synced, {} unchanged, {} rejected, {} exhausted, {} cancelled.",
            reports.len(),
            report.elapsed_secs,
            report.synced,
            report.unchanged,
            report.rejected.len(),
            report.exhausted.len(),
            report.cancelled.len()
        );

        if !report.bulk.meets_target || !report.within_bulk_window {
            warn!("Inventory batch is below its compliance target.");
        }

        Ok(report)
    }
}
