//! Event handling for triage-sync.
//!
//! This module coordinates the record store and the engines for each
//! incoming event:
//! - Ticket intake: triage, escalation, and the support channel round trip
//! - Stock reports: delta application and the sync retry loop
//!
//! Every handler holds the per-identifier lock of the entity it touches for
//! its whole read-modify-write cycle.

pub mod stock_report;
pub mod ticket_intake;
