//! Event types for the court room simulation
//!
//! Every state change the simulation makes is described by one of these
//! events. They are broadcast to subscribers and serialise to tagged JSON
//! for hosts that forward them elsewhere.

use serde::{Deserialize, Serialize};

use crate::message::{MessageKind, OccurrenceId, Severity};

/// All court room events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CourtEvent {
    /// The scheduler (or the host) added a message
    MessageEnqueued {
        occurrence: OccurrenceId,
        template_id: String,
        kind: MessageKind,
        at_ms: u64,
    },

    /// A legal message crossed its escalation delay
    MessageUrgent {
        occurrence: OccurrenceId,
        template_id: String,
        at_ms: u64,
    },

    /// A legal message stayed urgent for the whole grace window
    FineIncurred {
        occurrence: OccurrenceId,
        law_label: String,
        at_ms: u64,
    },

    /// The player dismissed an escalated message
    FineAcknowledged {
        occurrence: OccurrenceId,
        law_label: String,
        at_ms: u64,
    },

    /// A message left the active set
    MessageDismissed {
        occurrence: OccurrenceId,
        template_id: String,
        severity: Severity,
        at_ms: u64,
    },

    /// The session countdown ran out
    CountdownExpired { at_ms: u64 },

    /// The player moved between stages
    StageChanged { from: u8, to: u8, at_ms: u64 },
}

impl CourtEvent {
    /// Snake-case event name, matching the serde tag
    pub fn event_type(&self) -> &'static str {
        match self {
            CourtEvent::MessageEnqueued { .. } => "message_enqueued",
            CourtEvent::MessageUrgent { .. } => "message_urgent",
            CourtEvent::FineIncurred { .. } => "fine_incurred",
            CourtEvent::FineAcknowledged { .. } => "fine_acknowledged",
            CourtEvent::MessageDismissed { .. } => "message_dismissed",
            CourtEvent::CountdownExpired { .. } => "countdown_expired",
            CourtEvent::StageChanged { .. } => "stage_changed",
        }
    }

    pub fn at_ms(&self) -> u64 {
        match self {
            CourtEvent::MessageEnqueued { at_ms, .. }
            | CourtEvent::MessageUrgent { at_ms, .. }
            | CourtEvent::FineIncurred { at_ms, .. }
            | CourtEvent::FineAcknowledged { at_ms, .. }
            | CourtEvent::MessageDismissed { at_ms, .. }
            | CourtEvent::CountdownExpired { at_ms }
            | CourtEvent::StageChanged { at_ms, .. } => *at_ms,
        }
    }

    /// Occurrence the event refers to, if any
    pub fn occurrence(&self) -> Option<OccurrenceId> {
        match self {
            CourtEvent::MessageEnqueued { occurrence, .. }
            | CourtEvent::MessageUrgent { occurrence, .. }
            | CourtEvent::FineIncurred { occurrence, .. }
            | CourtEvent::FineAcknowledged { occurrence, .. }
            | CourtEvent::MessageDismissed { occurrence, .. } => Some(*occurrence),
            CourtEvent::CountdownExpired { .. } | CourtEvent::StageChanged { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = CourtEvent::FineIncurred {
            occurrence: OccurrenceId::new(3),
            law_label: "Disability Act".to_string(),
            at_ms: 260_000,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "fine_incurred");
        assert_eq!(json["occurrence"], 3);

        let parsed: CourtEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(parsed.event_type(), "fine_incurred");
    }

    #[test]
    fn test_event_accessors() {
        let event = CourtEvent::StageChanged {
            from: 1,
            to: 2,
            at_ms: 42,
        };
        assert_eq!(event.at_ms(), 42);
        assert_eq!(event.occurrence(), None);
        assert_eq!(event.event_type(), "stage_changed");
    }
}
