//! Domain entities and the result aliases shared by the whole crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error type for plumbing code.
pub type Err = anyhow::Error;
/// Result type for plumbing code.
pub type Res<T> = Result<T, Err>;
/// A [`Res`] with no value.
pub type Void = Res<()>;

// Tickets.

/// Urgency tag of a support ticket.
///
/// Ordered from least to most urgent, so `Critical > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityTag {
    /// Informational requests.
    Low,
    /// Orders, deliveries, and account access.
    Medium,
    /// Payments, blocked accounts, fraud, and outages.
    Critical,
}

impl PriorityTag {
    /// The customer-facing expected response time, in hours.
    pub fn expected_response_hours(self) -> u32 {
        match self {
            PriorityTag::Critical => 24,
            PriorityTag::Medium | PriorityTag::Low => 48,
        }
    }
}

/// A support ticket row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique, immutable identifier.
    pub id: String,
    /// Free-text category, e.g. "Payment not received".
    pub category: String,
    /// `None` until the ticket has been triaged.
    #[serde(default)]
    pub priority: Option<PriorityTag>,
    /// Customer-facing expected response time, in hours.
    pub expected_response_hours: u32,
    /// Raised once for critical tickets.
    #[serde(default)]
    pub escalated: bool,
    /// Tickets are closed, never deleted.
    #[serde(default)]
    pub closed: bool,
    /// When the ticket was opened.
    pub opened_at: DateTime<Utc>,
    /// Recorded first-response time, in seconds.
    #[serde(default)]
    pub response_secs: Option<u64>,
}

impl Ticket {
    /// Creates a new open ticket.
    pub fn new(id: impl Into<String>, category: impl Into<String>, priority: Option<PriorityTag>, opened_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            priority,
            expected_response_hours: priority.unwrap_or(PriorityTag::Low).expected_response_hours(),
            escalated: false,
            closed: false,
            opened_at,
            response_secs: None,
        }
    }

    /// Raises the priority to `tag` if it is more urgent than the current one.
    ///
    /// Returns `true` if the priority changed. A lower tag is ignored, so a
    /// ticket is never downgraded.
    pub fn raise_priority(&mut self, tag: PriorityTag) -> bool {
        match self.priority {
            Some(current) if current >= tag => false,
            _ => {
                self.priority = Some(tag);
                self.expected_response_hours = tag.expected_response_hours();
                true
            }
        }
    }

    /// Records the first-response time, keeping the earliest one seen.
    pub fn record_response(&mut self, response_secs: u64) {
        self.response_secs = Some(self.response_secs.map_or(response_secs, |existing| existing.min(response_secs)));
    }

    /// Marks the ticket closed.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

/// A ticket as it arrives from intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketIntake {
    /// Ticket identifier; repeated intakes address the same ticket.
    pub id: String,
    /// Free-text category.
    pub category: String,
    /// Tag supplied by the reporter, if any. Triage may raise it.
    #[serde(default)]
    pub priority: Option<PriorityTag>,
    /// When the ticket was opened. Defaults to now.
    #[serde(default = "Utc::now")]
    pub opened_at: DateTime<Utc>,
    /// Seconds between intake and initial triage.
    #[serde(default)]
    pub triage_secs: Option<u64>,
    /// Seconds between intake and first response.
    #[serde(default)]
    pub response_secs: Option<u64>,
    /// Close the ticket once it has been handled.
    #[serde(default)]
    pub close: bool,
}

/// A reply from the upstream support channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportReply {
    /// The ticket the reply answers.
    pub ticket_id: String,
    /// Message for the customer.
    pub message: String,
}

/// The payload shown when the upstream support channel is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackResponse {
    /// Message for the customer; never empty.
    pub message: String,
}

// Inventory.

/// A stock count for one location and SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Unique identifier.
    pub id: String,
    /// Store location.
    pub store: String,
    /// Quantity before the last applied report.
    pub previous_quantity: u64,
    /// Quantity of the last applied report.
    pub current_quantity: u64,
    /// Timestamp of the last stock report applied.
    pub last_observed_at: DateTime<Utc>,
    /// Timestamp of the last successful push to the sync target.
    pub last_synced_at: DateTime<Utc>,
    /// `last_observed_at - last_synced_at`, clamped at zero.
    pub sync_latency_secs: u64,
    /// Set when the current quantity has not reached the sync target yet.
    #[serde(default)]
    pub pending_sync: bool,
}

impl InventoryRecord {
    /// Creates the record for the first report seen for an identifier.
    pub fn new(id: impl Into<String>, store: impl Into<String>, quantity: u64, observed_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            store: store.into(),
            previous_quantity: 0,
            current_quantity: quantity,
            last_observed_at: observed_at,
            last_synced_at: observed_at,
            sync_latency_secs: 0,
            pending_sync: true,
        }
    }
}

/// An entry of the inventory source feed.
///
/// Delivery is at-least-once, so the same entry may arrive more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReport {
    /// Inventory record identifier.
    pub id: String,
    /// Reporting store location.
    pub store: String,
    /// Counted quantity; negative counts are rejected.
    pub quantity: i64,
    /// When the count was taken.
    pub observed_at: DateTime<Utc>,
}

// Reports.

/// Compliance of a batch against its operator target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Entities in the batch.
    pub total: usize,
    /// Entities within their bound.
    pub compliant: usize,
    /// `compliant / total`, or `1.0` for an empty batch.
    pub rate: f64,
    /// Operator target for this kind of batch.
    pub target: f64,
    /// Whether `rate >= target`.
    pub meets_target: bool,
}

impl ComplianceReport {
    /// Builds a report from counts. An empty batch is fully compliant.
    pub fn new(total: usize, compliant: usize, target: f64) -> Self {
        let rate = if total == 0 { 1.0 } else { compliant as f64 / total as f64 };

        Self {
            total,
            compliant,
            rate,
            target,
            meets_target: rate >= target,
        }
    }
}
