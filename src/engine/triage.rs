//! Ticket triage engine.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    base::{
        config::{Config, default_fallback_message},
        error::TriageError,
        types::{ComplianceReport, FallbackResponse, PriorityTag, SupportReply, Ticket},
    },
    service::support::SupportClient,
};

// Types.

/// Result of an escalation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Escalation {
    /// The flag was raised by this call.
    Escalated,
    /// The ticket was already escalated; nothing changed.
    AlreadyEscalated,
    /// Only critical tickets are escalated; nothing changed.
    NotEligible,
}

/// What the customer receives for a submitted ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SupportOutcome {
    Delivered(SupportReply),
    Fallback(FallbackResponse),
}

impl SupportOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, SupportOutcome::Fallback(_))
    }
}

/// Which operator target a ticket batch is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchClass {
    Critical,
    General,
}

// Engine.

/// Ticket triage engine.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct TriageEngine {
    inner: Arc<TriageEngineInner>,
}

struct TriageEngineInner {
    config: Config,
    support: SupportClient,
    critical_keywords: Vec<String>,
    medium_keywords: Vec<String>,
}

impl TriageEngine {
    pub fn new(config: &Config, support: SupportClient) -> Self {
        let normalize = |keywords: &[String]| -> Vec<String> { keywords.iter().map(|k| k.trim().to_lowercase()).filter(|k| !k.is_empty()).collect() };

        Self {
            inner: Arc::new(TriageEngineInner {
                config: config.clone(),
                support,
                critical_keywords: normalize(&config.critical_keywords),
                medium_keywords: normalize(&config.medium_keywords),
            }),
        }
    }

    /// Maps the ticket category to a priority tag.
    ///
    /// Critical keywords win over medium ones; a category matching neither is `Low`.
    pub fn classify(&self, ticket: &Ticket) -> PriorityTag {
        let category = ticket.category.to_lowercase();
        let matches = |keywords: &[String]| keywords.iter().any(|k| category.contains(k.as_str()));

        if matches(&self.inner.critical_keywords) {
            PriorityTag::Critical
        } else if matches(&self.inner.medium_keywords) {
            PriorityTag::Medium
        } else {
            PriorityTag::Low
        }
    }

    /// Classifies the ticket and raises its priority accordingly.
    ///
    /// Returns the resulting priority, which is never lower than before.
    pub fn triage(&self, ticket: &mut Ticket) -> PriorityTag {
        let tag = self.classify(ticket);

        if ticket.raise_priority(tag) {
            debug!("Ticket `{}` classified as {:?}.", ticket.id, tag);
        }

        // `raise_priority` always leaves a priority set.
        ticket.priority.unwrap_or(tag)
    }

    /// Initial-triage SLA check.
    ///
    /// Fails closed when the ticket has no priority.
    pub fn check_sla(&self, ticket: &Ticket, elapsed: Duration) -> bool {
        match ticket.priority {
            Some(PriorityTag::Critical) => elapsed < self.inner.config.critical_triage_bound,
            Some(PriorityTag::Medium | PriorityTag::Low) => elapsed < self.inner.config.general_response_bound,
            None => false,
        }
    }

    /// First-response SLA check used for batches.
    ///
    /// Fails closed when the ticket has no priority.
    pub fn check_first_response(&self, ticket: &Ticket, elapsed: Duration) -> bool {
        match ticket.priority {
            Some(PriorityTag::Critical) => elapsed < self.inner.config.critical_first_response_bound,
            Some(PriorityTag::Medium | PriorityTag::Low) => elapsed < self.inner.config.general_response_bound,
            None => false,
        }
    }

    /// Raises the escalation flag of a critical ticket. Idempotent.
    pub fn escalate(&self, ticket: &mut Ticket) -> Escalation {
        if ticket.priority != Some(PriorityTag::Critical) {
            return Escalation::NotEligible;
        }

        if ticket.escalated {
            return Escalation::AlreadyEscalated;
        }

        ticket.escalated = true;
        info!("Ticket `{}` escalated.", ticket.id);

        Escalation::Escalated
    }

    /// The payload returned whenever the support channel fails.
    pub fn handle_upstream_failure(&self) -> FallbackResponse {
        let message = self.inner.config.fallback_message.trim();

        FallbackResponse {
            message: if message.is_empty() { default_fallback_message() } else { message.to_string() },
        }
    }

    /// Submits the ticket upstream, substituting the fallback on any failure.
    #[instrument(skip_all, fields(ticket = %ticket.id))]
    pub async fn respond(&self, ticket: &Ticket) -> SupportOutcome {
        match self.inner.support.submit(ticket).await {
            Ok(reply) => SupportOutcome::Delivered(reply),
            Err(err) => {
                let err = TriageError::UpstreamUnavailable(err.to_string());
                warn!("{}; using fallback.", err);

                SupportOutcome::Fallback(self.handle_upstream_failure())
            }
        }
    }

    /// Fraction of tickets whose recorded response met their class's first-response bound.
    ///
    /// Tickets without a recorded response count as non-compliant.
    pub fn batch_compliance_rate(&self, tickets: &[Ticket]) -> f64 {
        self.compliance_report(tickets, BatchClass::General).rate
    }

    /// Compliance of a batch against the operator target for `class`.
    pub fn compliance_report(&self, tickets: &[Ticket], class: BatchClass) -> ComplianceReport {
        let compliant = tickets
            .iter()
            .filter(|t| t.response_secs.is_some_and(|secs| self.check_first_response(t, Duration::from_secs(secs))))
            .count();

        let target = match class {
            BatchClass::Critical => self.inner.config.critical_compliance_target,
            BatchClass::General => self.inner.config.general_compliance_target,
        };

        ComplianceReport::new(tickets.len(), compliant, target)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::{
        base::{config::ConfigInner, types::Res},
        service::support::GenericSupportChannel,
    };

    struct EchoChannel;

    #[async_trait]
    impl GenericSupportChannel for EchoChannel {
        async fn submit(&self, ticket: &Ticket) -> Res<SupportReply> {
            Ok(SupportReply {
                ticket_id: ticket.id.clone(),
                message: format!("Looking into `{}`.", ticket.category),
            })
        }
    }

    fn engine() -> TriageEngine {
        TriageEngine::new(&Config::default(), SupportClient::disconnected())
    }

    fn ticket(id: &str, category: &str, priority: Option<PriorityTag>) -> Ticket {
        Ticket::new(id, category, priority, Utc::now())
    }

    fn batch(priority: PriorityTag, total: usize, compliant: usize, bound: Duration) -> Vec<Ticket> {
        (0..total)
            .map(|i| {
                let mut t = ticket(&format!("CH{i:03}"), "batch", Some(priority));
                let secs = if i < compliant { bound.as_secs() - 1 } else { bound.as_secs() };
                t.record_response(secs);
                t
            })
            .collect()
    }

    #[test]
    fn test_classify_seed_categories() {
        let engine = engine();

        assert_eq!(engine.classify(&ticket("CH001", "Payment not received", None)), PriorityTag::Critical);
        assert_eq!(engine.classify(&ticket("CH002", "Account blocked", None)), PriorityTag::Critical);
        assert_eq!(engine.classify(&ticket("CH003", "Wrong delivery address", None)), PriorityTag::Medium);
        assert_eq!(engine.classify(&ticket("CH004", "Question about fees", None)), PriorityTag::Low);
        assert_eq!(engine.classify(&ticket("CH005", "Problem with the APP", None)), PriorityTag::Medium);
    }

    #[test]
    fn test_classify_uses_configured_keywords() {
        let config = Config {
            inner: Arc::new(ConfigInner {
                critical_keywords: vec!["  Chargeback ".to_string(), "".to_string()],
                medium_keywords: vec![],
                ..Default::default()
            }),
        };
        let engine = TriageEngine::new(&config, SupportClient::disconnected());

        assert_eq!(engine.classify(&ticket("CH010", "chargeback dispute", None)), PriorityTag::Critical);
        assert_eq!(engine.classify(&ticket("CH011", "Payment not received", None)), PriorityTag::Low);
    }

    #[test]
    fn test_triage_never_downgrades() {
        let engine = engine();
        let mut t = ticket("CH004", "Question about fees", Some(PriorityTag::Critical));

        assert_eq!(engine.triage(&mut t), PriorityTag::Critical);
        assert_eq!(t.priority, Some(PriorityTag::Critical));
    }

    #[test]
    fn test_critical_initial_triage_bound() {
        let engine = engine();
        let t = ticket("CH001", "Payment not received", Some(PriorityTag::Critical));

        assert!(engine.check_sla(&t, Duration::from_secs(30)));
        assert!(engine.check_sla(&t, Duration::from_secs(59)));
        assert!(!engine.check_sla(&t, Duration::from_secs(60)));
        assert!(!engine.check_sla(&t, Duration::from_secs(61)));
    }

    #[test]
    fn test_general_bound_is_two_hours() {
        let engine = engine();
        let t = ticket("CH003", "Wrong delivery address", Some(PriorityTag::Medium));

        assert!(engine.check_sla(&t, Duration::from_secs(7199)));
        assert!(!engine.check_sla(&t, Duration::from_secs(7200)));
        assert!(engine.check_first_response(&t, Duration::from_secs(3600)));
    }

    #[test]
    fn test_critical_first_response_bound() {
        let engine = engine();
        let t = ticket("CH002", "Account blocked", Some(PriorityTag::Critical));

        assert!(engine.check_first_response(&t, Duration::from_secs(14 * 60)));
        assert!(!engine.check_first_response(&t, Duration::from_secs(15 * 60)));
    }

    #[test]
    fn test_missing_priority_fails_closed() {
        let engine = engine();
        let t = ticket("CH006", "Anything", None);

        assert!(!engine.check_sla(&t, Duration::ZERO));
        assert!(!engine.check_first_response(&t, Duration::ZERO));
    }

    #[test]
    fn test_escalate_is_idempotent() {
        let engine = engine();
        let mut t = ticket("CH001", "Payment not received", Some(PriorityTag::Critical));

        assert_eq!(engine.escalate(&mut t), Escalation::Escalated);
        assert_eq!(engine.escalate(&mut t), Escalation::AlreadyEscalated);
        assert!(t.escalated);
    }

    #[test]
    fn test_escalate_ignores_non_critical() {
        let engine = engine();
        let mut t = ticket("CH004", "Question about fees", Some(PriorityTag::Low));

        assert_eq!(engine.escalate(&mut t), Escalation::NotEligible);
        assert!(!t.escalated);
    }

    #[test]
    fn test_fallback_is_never_empty() {
        let blank = Config {
            inner: Arc::new(ConfigInner {
                fallback_message: " ".to_string(),
                ..Default::default()
            }),
        };

        for engine in [engine(), TriageEngine::new(&blank, SupportClient::disconnected())] {
            let first = engine.handle_upstream_failure();
            let second = engine.handle_upstream_failure();

            assert!(!first.message.is_empty());
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn test_respond_substitutes_fallback() {
        let engine = engine();
        let t = ticket("CH001", "Payment not received", Some(PriorityTag::Critical));

        let outcome = engine.respond(&t).await;

        assert_eq!(outcome, SupportOutcome::Fallback(engine.handle_upstream_failure()));
    }

    #[tokio::test]
    async fn test_respond_delivers_upstream_reply() {
        let engine = TriageEngine::new(&Config::default(), SupportClient::new(Arc::new(EchoChannel)));
        let t = ticket("CH003", "Wrong delivery address", Some(PriorityTag::Medium));

        let outcome = engine.respond(&t).await;

        assert!(!outcome.is_fallback());
    }

    #[test]
    fn test_critical_batch_compliance() {
        let engine = engine();
        let tickets = batch(PriorityTag::Critical, 100, 87, Duration::from_secs(15 * 60));

        let report = engine.compliance_report(&tickets, BatchClass::Critical);

        assert_eq!(report.rate, 0.87);
        assert!(report.meets_target);
    }

    #[test]
    fn test_general_batch_compliance() {
        let engine = engine();
        let tickets = batch(PriorityTag::Medium, 100, 96, Duration::from_secs(2 * 60 * 60));

        assert_eq!(engine.batch_compliance_rate(&tickets), 0.96);
        assert!(engine.compliance_report(&tickets, BatchClass::General).meets_target);
    }

    #[test]
    fn test_unanswered_tickets_are_non_compliant() {
        let engine = engine();
        let mut tickets = batch(PriorityTag::Low, 3, 3, Duration::from_secs(7200));
        tickets.push(ticket("CH999", "Question about fees", Some(PriorityTag::Low)));

        assert_eq!(engine.batch_compliance_rate(&tickets), 0.75);
    }
}
