//! Error taxonomy for the triage and reconciliation engines.
//!
//! Plumbing code (config, runtime, the binary) uses the `anyhow`-based
//! [`Res`](super::types::Res) alias. The engines use the typed errors below so
//! callers can tell a rejected input from a terminal sync failure.

use thiserror::Error;

/// Result type of the reconciliation engine.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Failures of the ticket triage engine.
///
/// These never cross the engine boundary: the engine recovers from every one
/// of them with a fallback payload.
#[derive(Debug, Error)]
pub enum TriageError {
    /// The upstream support channel could not be reached or returned a failure.
    #[error("upstream support channel unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Failures of the inventory reconciliation engine.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A stock report carried a negative quantity. Rejected, never retried.
    #[error("invalid quantity {quantity} for inventory record `{id}`")]
    InvalidQuantity {
        /// Inventory record identifier.
        id: String,
        /// The rejected quantity.
        quantity: i64,
    },

    /// A single synchronization attempt failed. Retried until the attempt cap.
    #[error("sync attempt {attempt} failed: {reason}")]
    SyncAttemptFailed {
        /// 1-based attempt number.
        attempt: u32,
        /// Failure reported by the sync target.
        reason: String,
    },

    /// Every synchronization attempt failed. Surfaced to the operator path.
    #[error("sync of inventory record `{id}` exhausted after {attempts} attempts")]
    SyncExhausted {
        /// Inventory record identifier.
        id: String,
        /// Attempts made.
        attempts: u32,
    },

    /// The retry loop was cancelled between attempts.
    #[error("sync of inventory record `{id}` cancelled after {attempts} attempts")]
    SyncCancelled {
        /// Inventory record identifier.
        id: String,
        /// Attempts made before cancellation.
        attempts: u32,
    },

    /// The record store failed.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
