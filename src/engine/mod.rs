//! Decision engines.
//!
//! - [`triage`]: ticket classification, SLA checks, escalation, and the
//!   support channel fallback.
//! - [`reconcile`]: stock delta application, sync latency bounds, and the
//!   capped sync retry loop.
//!
//! Engines hold configuration and service handles only. They never own
//! entities: rows are borrowed from the record store and new values are
//! handed back to the caller.

pub mod reconcile;
pub mod triage;
