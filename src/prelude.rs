pub use crate::base::{
    config::Config,
    error::{ReconcileError, TriageError},
    types::{Err, InventoryRecord, PriorityTag, Res, StockReport, Ticket, TicketIntake, Void},
};
pub use crate::engine::{
    reconcile::{ReconciliationEngine, SyncResult},
    triage::{Escalation, SupportOutcome, TriageEngine},
};
pub use crate::runtime::Runtime;
pub use anyhow::anyhow;
pub use tracing::{debug, error, info, instrument, warn};
