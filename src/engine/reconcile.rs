//! Inventory reconciliation engine.
//!
//! Applies stock deltas to inventory records, measures how far each record
//! lags behind the sync target, and pushes records downstream through a capped
//! retry loop.
//!
//! The retry loop is a small state machine:
//!
//! ```text
//! Pending --start--> Attempting(1)
//! Attempting(n) --ok--> Succeeded(n)
//! Attempting(n) --err, n < max--> Attempting(n + 1)
//! Attempting(n) --err, n = max--> Exhausted(n)
//! Attempting(n) --cancel before retry--> Cancelled(n - 1)
//! ```
//!
//! `Succeeded`, `Exhausted`, and `Cancelled` are terminal. Backoff is applied
//! before every retry and never before the first attempt.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    base::{
        config::Config,
        error::{ReconcileError, ReconcileResult},
        types::{ComplianceReport, InventoryRecord},
    },
    service::{clock::Clock, sync::SyncClient},
};

// Types.

/// State of a single `sync_with_retry` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Pending,
    /// Making attempt `n` (1-based).
    Attempting(u32),
    Succeeded(u32),
    Exhausted(u32),
    Cancelled(u32),
}

impl SyncState {
    /// `Pending -> Attempting(1)`. Other states are left as they are.
    pub fn start(self) -> Self {
        match self {
            SyncState::Pending => SyncState::Attempting(1),
            other => other,
        }
    }

    /// The current attempt succeeded.
    pub fn succeed(self) -> Self {
        match self {
            SyncState::Attempting(n) => SyncState::Succeeded(n),
            other => other,
        }
    }

    /// The current attempt failed; retry while attempts remain.
    pub fn fail(self, max_attempts: u32) -> Self {
        match self {
            SyncState::Attempting(n) if n < max_attempts => SyncState::Attempting(n + 1),
            SyncState::Attempting(n) => SyncState::Exhausted(n),
            other => other,
        }
    }

    /// Cancellation observed before the current attempt started.
    pub fn cancel(self) -> Self {
        match self {
            SyncState::Pending => SyncState::Cancelled(0),
            SyncState::Attempting(n) => SyncState::Cancelled(n - 1),
            other => other,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SyncState::Succeeded(_) | SyncState::Exhausted(_) | SyncState::Cancelled(_))
    }
}

/// Terminal outcome of `sync_with_retry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SyncResult {
    /// The push succeeded on the given (1-based) attempt.
    Succeeded { attempt: u32 },
    /// Every attempt failed.
    Exhausted { attempts: u32 },
    /// Cancelled between attempts after the given number of attempts.
    Cancelled { attempts: u32 },
}

// Engine.

/// Inventory reconciliation engine.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ReconciliationEngine {
    inner: Arc<ReconciliationEngineInner>,
}

struct ReconciliationEngineInner {
    config: Config,
    sync: SyncClient,
    clock: Clock,
}

impl ReconciliationEngine {
    pub fn new(config: &Config, sync: SyncClient, clock: Clock) -> Self {
        Self {
            inner: Arc::new(ReconciliationEngineInner {
                config: config.clone(),
                sync,
                clock,
            }),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.inner.clock
    }

    /// Applies a stock report to `record` and returns the updated record.
    ///
    /// A negative quantity fails with `InvalidQuantity`. A replay of the last
    /// applied `(observed_at, quantity)` pair, or a report older than the last
    /// one applied, returns the record unchanged.
    pub fn apply_delta(&self, record: &InventoryRecord, new_quantity: i64, observed_at: DateTime<Utc>) -> ReconcileResult<InventoryRecord> {
        let quantity = u64::try_from(new_quantity).map_err(|_| ReconcileError::InvalidQuantity {
            id: record.id.clone(),
            quantity: new_quantity,
        })?;

        if observed_at == record.last_observed_at && quantity == record.current_quantity {
            debug!("Replayed report for `{}` ignored.", record.id);
            return Ok(record.clone());
        }

        if observed_at < record.last_observed_at {
            debug!("Stale report for `{}` ignored ({} < {}).", record.id, observed_at, record.last_observed_at);
            return Ok(record.clone());
        }

        let latency = (observed_at - record.last_synced_at).num_seconds().max(0) as u64;

        Ok(InventoryRecord {
            previous_quantity: record.current_quantity,
            current_quantity: quantity,
            last_observed_at: observed_at,
            sync_latency_secs: latency,
            pending_sync: true,
            ..record.clone()
        })
    }

    /// Whether the record's sync latency is within the realtime bound.
    pub fn is_within_realtime_bound(&self, record: &InventoryRecord) -> bool {
        Duration::from_secs(record.sync_latency_secs) <= self.inner.config.realtime_sync_bound
    }

    /// Pushes the record with the configured attempt cap and backoff.
    pub async fn sync(&self, record: &InventoryRecord, cancel: &CancellationToken) -> SyncResult {
        self.sync_with_retry_until(record, self.inner.config.sync_max_attempts, self.inner.config.sync_backoff, cancel).await
    }

    /// Pushes the record, retrying failed attempts up to `max_attempts`.
    pub async fn sync_with_retry(&self, record: &InventoryRecord, max_attempts: u32, backoff: Duration) -> SyncResult {
        self.sync_with_retry_until(record, max_attempts, backoff, &CancellationToken::new()).await
    }

    /// [`Self::sync_with_retry`] that stops between attempts once `cancel` fires.
    ///
    /// An attempt that has started always runs to completion. A cap of zero is
    /// treated as one attempt.
    #[instrument(skip_all, fields(record = %record.id))]
    pub async fn sync_with_retry_until(&self, record: &InventoryRecord, max_attempts: u32, backoff: Duration, cancel: &CancellationToken) -> SyncResult {
        let max_attempts = max_attempts.max(1);
        let mut state = SyncState::Pending.start();

        while let SyncState::Attempting(attempt) = state {
            if attempt > 1 {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        state = state.cancel();
                        continue;
                    }
                    _ = self.inner.clock.sleep(backoff) => {}
                }
            }

            if cancel.is_cancelled() {
                state = state.cancel();
                continue;
            }

            match self.inner.sync.push(record).await {
                Ok(()) => state = state.succeed(),
                Err(err) => {
                    let failure = ReconcileError::SyncAttemptFailed {
                        attempt,
                        reason: err.to_string(),
                    };
                    warn!("{}", failure);

                    state = state.fail(max_attempts);
                }
            }
        }

        match state {
            SyncState::Succeeded(attempt) => {
                info!("Synced `{}` on attempt {}.", record.id, attempt);
                SyncResult::Succeeded { attempt }
            }
            SyncState::Exhausted(attempts) => SyncResult::Exhausted { attempts },
            SyncState::Cancelled(attempts) => SyncResult::Cancelled { attempts },
            // The loop only exits on a terminal state.
            SyncState::Pending | SyncState::Attempting(_) => SyncResult::Cancelled { attempts: 0 },
        }
    }

    /// Stamps a successful sync onto the record.
    pub fn mark_synced(&self, record: &InventoryRecord) -> InventoryRecord {
        InventoryRecord {
            last_synced_at: self.inner.clock.now(),
            pending_sync: false,
            ..record.clone()
        }
    }

    /// Fraction of records whose sync latency is within the bulk sync window.
    pub fn batch_sync_compliance_rate(&self, records: &[InventoryRecord]) -> f64 {
        self.bulk_report(records).rate
    }

    /// Compliance of a bulk load against the bulk target.
    pub fn bulk_report(&self, records: &[InventoryRecord]) -> ComplianceReport {
        let window = self.inner.config.bulk_sync_window;
        let compliant = records.iter().filter(|r| Duration::from_secs(r.sync_latency_secs) <= window).count();

        ComplianceReport::new(records.len(), compliant, self.inner.config.bulk_compliance_target)
    }
}

// Tests.
