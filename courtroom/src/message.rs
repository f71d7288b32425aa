//! Message templates and their active occurrences

use serde::{Deserialize, Serialize};

/// Whether a message can escalate into a fine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Compliance issue that escalates toward a fine if ignored
    Legal,
    /// Interruption that only needs acknowledging
    Distraction,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legal => write!(f, "legal"),
            Self::Distraction => write!(f, "distraction"),
        }
    }
}

impl std::str::FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legal" => Ok(Self::Legal),
            "distraction" => Ok(Self::Distraction),
            other => Err(format!("unknown message kind '{other}'")),
        }
    }
}

/// Who a distraction comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistractionKind {
    Family,
    Boss,
    Agile,
}

impl std::fmt::Display for DistractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Family => write!(f, "family"),
            Self::Boss => write!(f, "boss"),
            Self::Agile => write!(f, "agile"),
        }
    }
}

/// Severity ladder. Only legal messages ever leave `Normal`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Normal,
    Urgent,
    /// Terminal: the fine has landed
    Escalated,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Urgent => write!(f, "urgent"),
            Self::Escalated => write!(f, "escalated"),
        }
    }
}

/// Immutable catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    /// Unique identifier within the pool
    pub id: String,
    /// Display text
    pub text: String,
    pub kind: MessageKind,
    /// Sender, for distractions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subkind: Option<DistractionKind>,
    /// Time from first appearance to urgent promotion (legal only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_delay_ms: Option<u64>,
    /// Law named on the fine (legal only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub law_label: Option<String>,
}

impl MessageTemplate {
    /// Build a legal template.
    pub fn legal(
        id: impl Into<String>,
        text: impl Into<String>,
        escalation_delay_ms: u64,
        law_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: MessageKind::Legal,
            subkind: None,
            escalation_delay_ms: Some(escalation_delay_ms),
            law_label: Some(law_label.into()),
        }
    }

    /// Build a distraction template.
    pub fn distraction(
        id: impl Into<String>,
        text: impl Into<String>,
        subkind: DistractionKind,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: MessageKind::Distraction,
            subkind: Some(subkind),
            escalation_delay_ms: None,
            law_label: None,
        }
    }

    pub fn is_legal(&self) -> bool {
        self.kind == MessageKind::Legal
    }
}

/// Per-set identifier of one enqueued occurrence.
///
/// Allocated alongside `first_seen_at` so two occurrences of the same
/// template enqueued in the same millisecond stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccurrenceId(u64);

impl OccurrenceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One live occurrence of a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveMessage {
    pub occurrence: OccurrenceId,
    pub template: MessageTemplate,
    /// Display text; gains the urgency marker on promotion
    pub text: String,
    pub first_seen_at: u64,
    pub urgent_since: Option<u64>,
    pub severity: Severity,
}

impl ActiveMessage {
    /// Instantiate `template` as a fresh `Normal` occurrence.
    pub fn new(occurrence: OccurrenceId, template: MessageTemplate, now_ms: u64) -> Self {
        Self {
            occurrence,
            text: template.text.clone(),
            template,
            first_seen_at: now_ms,
            urgent_since: None,
            severity: Severity::Normal,
        }
    }

    pub fn id(&self) -> &str {
        &self.template.id
    }

    pub fn kind(&self) -> MessageKind {
        self.template.kind
    }

    pub fn is_legal(&self) -> bool {
        self.template.is_legal()
    }

    pub fn is_urgent(&self) -> bool {
        self.severity >= Severity::Urgent
    }

    pub fn is_escalated(&self) -> bool {
        self.severity == Severity::Escalated
    }

    pub fn law_label(&self) -> Option<&str> {
        self.template.law_label.as_deref()
    }

    /// Milliseconds since this occurrence was enqueued.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.first_seen_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Normal < Severity::Urgent);
        assert!(Severity::Urgent < Severity::Escalated);
        assert_eq!(Severity::default(), Severity::Normal);
    }

    #[test]
    fn test_new_occurrence_starts_normal() {
        let template = MessageTemplate::legal("imgAlt", "Fix alt in img1", 120_000, "Disability Act");
        let msg = ActiveMessage::new(OccurrenceId::new(1), template, 5_000);
        assert_eq!(msg.severity, Severity::Normal);
        assert_eq!(msg.text, "Fix alt in img1");
        assert_eq!(msg.first_seen_at, 5_000);
        assert!(msg.urgent_since.is_none());
        assert_eq!(msg.law_label(), Some("Disability Act"));
        assert_eq!(msg.age_ms(4_000), 0);
        assert_eq!(msg.age_ms(7_500), 2_500);
    }

    #[test]
    fn test_template_serde_snake_case() {
        let template = MessageTemplate::distraction("bossSprint", "Boss: done?", DistractionKind::Boss);
        let json = serde_json::to_value(&template).unwrap();
        assert_eq!(json["kind"], "distraction");
        assert_eq!(json["subkind"], "boss");
        assert!(json.get("law_label").is_none());

        let back: MessageTemplate = serde_json::from_value(json).unwrap();
        assert_eq!(back, template);
    }

    #[test]
    fn test_message_kind_from_str() {
        assert_eq!("Legal".parse::<MessageKind>(), Ok(MessageKind::Legal));
        assert_eq!(" distraction ".parse::<MessageKind>(), Ok(MessageKind::Distraction));
        assert!("fine".parse::<MessageKind>().is_err());
    }
}
