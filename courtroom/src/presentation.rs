//! Render-ready view of an active message for notification sinks.

use serde::{Deserialize, Serialize};

use crate::message::{ActiveMessage, DistractionKind, MessageKind, OccurrenceId, Severity};

/// How loudly a sink should present a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTone {
    /// Escalated legal message: the fine
    Fine,
    /// Urgent legal message
    Urgent,
    /// Legal message still within its silent period
    Notice,
    Family,
    Boss,
    Agile,
}

impl AlertTone {
    /// Short tag for plain-text sinks.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Fine => "FINE",
            Self::Urgent => "URGENT",
            Self::Notice => "LEGAL",
            Self::Family => "FAMILY",
            Self::Boss => "BOSS",
            Self::Agile => "AGILE",
        }
    }
}

/// What a notification sink needs to draw one alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertView {
    pub occurrence: OccurrenceId,
    pub text: String,
    pub tone: AlertTone,
    /// Label for the dismiss action
    pub action_label: &'static str,
    /// Law named on the alert; only present once the fine has landed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub law_label: Option<String>,
}

impl From<&ActiveMessage> for AlertView {
    fn from(msg: &ActiveMessage) -> Self {
        let tone = match (msg.kind(), msg.severity, msg.template.subkind) {
            (MessageKind::Legal, Severity::Escalated, _) => AlertTone::Fine,
            (MessageKind::Legal, Severity::Urgent, _) => AlertTone::Urgent,
            (MessageKind::Legal, Severity::Normal, _) => AlertTone::Notice,
            (MessageKind::Distraction, _, Some(DistractionKind::Family)) => AlertTone::Family,
            (MessageKind::Distraction, _, Some(DistractionKind::Boss)) => AlertTone::Boss,
            (MessageKind::Distraction, _, Some(DistractionKind::Agile)) => AlertTone::Agile,
            (MessageKind::Distraction, _, None) => AlertTone::Notice,
        };

        let action_label = match tone {
            AlertTone::Family => "OK",
            AlertTone::Boss => "Done",
            _ => "Fixed",
        };

        let law_label = if msg.is_legal() && msg.is_escalated() {
            msg.law_label().map(str::to_string)
        } else {
            None
        };

        Self {
            occurrence: msg.occurrence,
            text: msg.text.clone(),
            tone,
            action_label,
            law_label,
        }
    }
}

impl std::fmt::Display for AlertView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.occurrence, self.tone.tag(), self.text)?;
        if let Some(law) = &self.law_label {
            write!(f, " ({law})")?;
        }
        write!(f, " <{}>", self.action_label)
    }
}
