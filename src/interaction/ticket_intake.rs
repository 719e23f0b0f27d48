//! This module handles ticket intake events.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    base::types::{PriorityTag, Res, Ticket, TicketIntake},
    engine::triage::{Escalation, SupportOutcome, TriageEngine},
    service::store::StoreClient,
};

/// What happened to a ticket during intake.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeOutcome {
    pub ticket: Ticket,
    pub priority: PriorityTag,
    /// Whether initial triage met its SLA, if the triage time was reported.
    pub triage_within_sla: Option<bool>,
    pub escalation: Escalation,
    /// `None` for tickets that were already closed.
    pub support: Option<SupportOutcome>,
}

/// Handles a ticket intake event.
///
/// Runs under the ticket's lock: loads or creates the ticket, triages it,
/// escalates criticals, submits it upstream (falling back on failure), and
/// stores the result. Only record store failures are returned as errors.
#[instrument(skip_all, fields(ticket = %intake.id))]
pub async fn handle_ticket_intake(intake: TicketIntake, store: &StoreClient, triage: &TriageEngine) -> Res<IntakeOutcome> {
    let _guard = store.locks().lock(&intake.id).await;

    // First, get the ticket from the store; or, open a new one.

    let mut ticket = match store.get_ticket(&intake.id).await? {
        Some(existing) => existing,
        None => {
            info!("Ticket `{}` not found, opening a new one.", intake.id);
            Ticket::new(intake.id.as_str(), intake.category.as_str(), None, intake.opened_at)
        }
    };

    if let Some(reported) = intake.priority {
        ticket.raise_priority(reported);
    }

    let priority = triage.triage(&mut ticket);

    if let Some(secs) = intake.response_secs {
        ticket.record_response(secs);
    }

    let triage_within_sla = intake.triage_secs.map(|secs| triage.check_sla(&ticket, Duration::from_secs(secs)));

    if triage_within_sla == Some(false) {
        warn!("Ticket `{}` missed its initial triage SLA.", ticket.id);
    }

    let escalation = triage.escalate(&mut ticket);

    // Closed tickets are never resubmitted.

    let support = if ticket.closed {
        warn!("Ticket `{}` is closed; not submitting upstream.", ticket.id);
        None
    } else {
        Some(triage.respond(&ticket).await)
    };

    if intake.close {
        ticket.close();
    }

    store.put_ticket(&ticket).await?;

    Ok(IntakeOutcome {
        ticket,
        priority,
        triage_within_sla,
        escalation,
        support,
    })
}
