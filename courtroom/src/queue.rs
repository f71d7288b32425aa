//! Active message set
//!
//! Holds the live occurrences in insertion order. Ticks are applied by
//! computing the whole next set from a read-only view and swapping it in,
//! so an enqueue can never land halfway through a scan.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::{EscalationEngine, Transition};
use crate::error::{CourtError, CourtResult};
use crate::message::{ActiveMessage, MessageTemplate, OccurrenceId, Severity};

/// What a dismissal removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dismissal {
    pub message: ActiveMessage,
    /// True when the removed message had already escalated into a fine
    pub fine_acknowledged: bool,
}

/// Ordered set of live message occurrences
#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    messages: Vec<ActiveMessage>,
    next_occurrence: u64,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fresh `Normal` occurrence of `template` seen at `now_ms`.
    pub fn enqueue(&mut self, template: MessageTemplate, now_ms: u64) -> OccurrenceId {
        self.next_occurrence += 1;
        let occurrence = OccurrenceId::new(self.next_occurrence);
        let msg = ActiveMessage::new(occurrence, template, now_ms);
        info!(
            %occurrence,
            id = %msg.template.id,
            kind = %msg.template.kind,
            first_seen_at = now_ms,
            "Enqueued message"
        );
        self.messages.push(msg);
        occurrence
    }

    /// Run one engine tick and replace the whole set with its result.
    pub fn apply_tick(&mut self, engine: &EscalationEngine, now_ms: u64) -> Vec<Transition> {
        let outcome = engine.tick(now_ms, &self.messages);
        self.messages = outcome.messages;
        for t in &outcome.transitions {
            match t.to {
                Severity::Urgent => info!(occurrence = %t.occurrence, id = %t.template_id, "Marking urgent"),
                Severity::Escalated => info!(
                    occurrence = %t.occurrence,
                    id = %t.template_id,
                    law = t.law_label.as_deref().unwrap_or_default(),
                    "Escalating to court fine"
                ),
                Severity::Normal => {}
            }
        }
        outcome.transitions
    }

    /// Remove an occurrence unconditionally.
    ///
    /// A dismissed `Normal` legal message is simply dropped; it does not
    /// come back.
    pub fn dismiss(&mut self, occurrence: OccurrenceId) -> CourtResult<Dismissal> {
        let idx = self
            .messages
            .iter()
            .position(|m| m.occurrence == occurrence)
            .ok_or(CourtError::UnknownOccurrence(occurrence))?;

        let message = self.messages.remove(idx);
        let fine_acknowledged = message.is_escalated();
        info!(
            %occurrence,
            id = %message.template.id,
            severity = %message.severity,
            fine_acknowledged,
            "Message closed"
        );
        Ok(Dismissal {
            message,
            fine_acknowledged,
        })
    }

    pub fn get(&self, occurrence: OccurrenceId) -> Option<&ActiveMessage> {
        self.messages.iter().find(|m| m.occurrence == occurrence)
    }

    /// Read-only view in insertion order.
    pub fn messages(&self) -> &[ActiveMessage] {
        &self.messages
    }

    /// Owned copy for observers.
    pub fn snapshot(&self) -> Vec<ActiveMessage> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop every occurrence. Occurrence ids keep counting up.
    pub fn clear(&mut self) {
        if !self.messages.is_empty() {
            debug!(dropped = self.messages.len(), "Active set cleared");
        }
        self.messages.clear();
    }

    /// Count of occurrences at `severity`.
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|m| m.severity == severity).count()
    }
}
