//! Escalation Engine: deterministic severity promotion for legal messages
//!
//! Each tick is a pure function of `(now, active set)`: it returns the next
//! active set and the transitions that happened. Owners replace their set
//! wholesale with the result and report the transitions.
//!
//! ```text
//! NORMAL ──(now - first_seen_at ≥ escalation_delay)──▶ URGENT
//! URGENT ──(now - urgent_since ≥ second_escalation_delay)──▶ ESCALATED (fine)
//! ESCALATED is terminal until dismissed
//! ```
//!
//! Distractions stay `Normal` forever and are passed through untouched.

use serde::{Deserialize, Serialize};

use crate::message::{ActiveMessage, OccurrenceId, Severity};

/// Fallback delay before a legal message turns urgent
pub const DEFAULT_ESCALATION_DELAY_MS: u64 = 120_000;
/// Grace period a message stays urgent before the fine lands
pub const DEFAULT_SECOND_ESCALATION_DELAY_MS: u64 = 120_000;
/// Period between escalation scans
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
/// Prefix added to the display text on urgent promotion
pub const DEFAULT_URGENT_MARKER: &str = "URGENT: ";

/// Configuration for the Escalation Engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Period between scans of the active set
    pub tick_interval_ms: u64,
    /// Urgent → escalated window
    pub second_escalation_delay_ms: u64,
    /// Used for legal messages whose template carries no delay
    pub default_escalation_delay_ms: u64,
    /// Prepended to the display text on urgent promotion
    pub urgent_marker: String,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            second_escalation_delay_ms: DEFAULT_SECOND_ESCALATION_DELAY_MS,
            default_escalation_delay_ms: DEFAULT_ESCALATION_DELAY_MS,
            urgent_marker: DEFAULT_URGENT_MARKER.to_string(),
        }
    }
}

/// A single severity change observed during a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub occurrence: OccurrenceId,
    pub template_id: String,
    pub from: Severity,
    pub to: Severity,
    pub law_label: Option<String>,
    /// Tick time at which the change was applied
    pub at: u64,
}

impl Transition {
    /// Whether this transition lands a fine.
    pub fn is_fine(&self) -> bool {
        self.to == Severity::Escalated
    }
}

/// Result of one tick
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// Replacement active set, same order as the input
    pub messages: Vec<ActiveMessage>,
    /// Changes in insertion order of the affected messages
    pub transitions: Vec<Transition>,
}

impl TickOutcome {
    /// Transitions that reached `Escalated`.
    pub fn fines(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(|t| t.is_fine())
    }
}

/// The Escalation Engine: deterministic state machine
#[derive(Debug, Clone, Default)]
pub struct EscalationEngine {
    config: EscalationConfig,
}

impl EscalationEngine {
    /// Create a new engine with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: EscalationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Delay before `msg` turns urgent.
    pub fn escalation_delay(&self, msg: &ActiveMessage) -> u64 {
        msg.template
            .escalation_delay_ms
            .unwrap_or(self.config.default_escalation_delay_ms)
    }

    /// Scan `messages` at `now_ms` and produce the next set.
    pub fn tick(&self, now_ms: u64, messages: &[ActiveMessage]) -> TickOutcome {
        let mut outcome = TickOutcome {
            messages: Vec::with_capacity(messages.len()),
            transitions: Vec::new(),
        };

        for msg in messages {
            let mut next = msg.clone();
            if next.is_legal() {
                self.advance(&mut next, now_ms, &mut outcome.transitions);
            }
            outcome.messages.push(next);
        }

        outcome
    }

    /// Earliest time at which `msg` will change severity, if ever.
    pub fn next_transition_at(&self, msg: &ActiveMessage) -> Option<u64> {
        if !msg.is_legal() {
            return None;
        }
        match msg.severity {
            Severity::Normal => Some(msg.first_seen_at.saturating_add(self.escalation_delay(msg))),
            Severity::Urgent => msg
                .urgent_since
                .map(|since| since.saturating_add(self.config.second_escalation_delay_ms)),
            Severity::Escalated => None,
        }
    }

    fn advance(&self, msg: &mut ActiveMessage, now_ms: u64, out: &mut Vec<Transition>) {
        if msg.severity == Severity::Normal
            && now_ms.saturating_sub(msg.first_seen_at) >= self.escalation_delay(msg)
        {
            msg.severity = Severity::Urgent;
            msg.urgent_since = Some(now_ms);
            msg.text = format!("{}{}", self.config.urgent_marker, msg.text);
            out.push(transition(msg, Severity::Normal, now_ms));
        }

        if msg.severity == Severity::Urgent {
            // An urgent message always carries urgent_since; treat a missing
            // one as "just now" so it still gets the full grace window.
            let since = *msg.urgent_since.get_or_insert(now_ms);
            if now_ms.saturating_sub(since) >= self.config.second_escalation_delay_ms {
                msg.severity = Severity::Escalated;
                out.push(transition(msg, Severity::Urgent, now_ms));
            }
        }
    }
}

fn transition(msg: &ActiveMessage, from: Severity, at: u64) -> Transition {
    Transition {
        occurrence: msg.occurrence,
        template_id: msg.template.id.clone(),
        from,
        to: msg.severity,
        law_label: msg.template.law_label.clone(),
        at,
    }
}
