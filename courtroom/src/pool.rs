//! Message Pool: the read-only catalog the scheduler draws from

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::engine::DEFAULT_ESCALATION_DELAY_MS;
use crate::error::{CourtError, CourtResult};
use crate::message::{DistractionKind, MessageKind, MessageTemplate};

/// Read-only catalog of message templates. Never empty.
#[derive(Debug, Clone)]
pub struct MessagePool {
    templates: Vec<MessageTemplate>,
}

impl MessagePool {
    /// The built-in catalog: 4 legal issues and 5 distractions.
    pub fn reference() -> Self {
        Self {
            templates: vec![
                MessageTemplate::legal("imgAlt", "Fix alt in img1", 120_000, "Disability Act"),
                MessageTemplate::legal(
                    "inputValidation",
                    "Fix input validation",
                    120_000,
                    "Laws of Tort",
                ),
                MessageTemplate::legal("userLogin", "Fix User login", 120_000, "Bankruptcy Act"),
                MessageTemplate::legal(
                    "secureDatabase",
                    "Fix Secure Database",
                    120_000,
                    "Laws of Tort",
                ),
                MessageTemplate::distraction(
                    "bossSprint",
                    "Boss: Are you done with sprint 1?",
                    DistractionKind::Boss,
                ),
                MessageTemplate::distraction(
                    "bossUpdate",
                    "Boss: I need an update on sprint 1.",
                    DistractionKind::Boss,
                ),
                MessageTemplate::distraction(
                    "familyReminder",
                    "Family: Can you pick up the kids after work?",
                    DistractionKind::Family,
                ),
                MessageTemplate::distraction(
                    "familyUpdate",
                    "Family: What are we doing for dinner tonight?",
                    DistractionKind::Family,
                ),
                MessageTemplate::distraction(
                    "agileRequest",
                    "Agile Team: Change the title color to red",
                    DistractionKind::Agile,
                ),
            ],
        }
    }

    /// Build a pool from caller-supplied templates.
    ///
    /// Malformed templates are skipped with a warning rather than failing
    /// the whole pool. Fails only when nothing usable remains.
    pub fn new(templates: impl IntoIterator<Item = MessageTemplate>) -> CourtResult<Self> {
        let mut kept = Vec::new();
        let mut skipped = 0usize;

        for template in templates {
            match normalize_template(template) {
                Ok(t) => {
                    if kept.iter().any(|k: &MessageTemplate| k.id == t.id) {
                        warn!(id = %t.id, "Duplicate template id, keeping the first");
                        skipped += 1;
                        continue;
                    }
                    kept.push(t);
                }
                Err(reason) => {
                    warn!(reason = %reason, "Skipping malformed message template");
                    skipped += 1;
                }
            }
        }

        if kept.is_empty() {
            return Err(CourtError::EmptyPool { skipped });
        }

        debug!(templates = kept.len(), skipped, "Message pool built");
        Ok(Self { templates: kept })
    }

    /// Uniformly pick a template, optionally restricted to one kind.
    ///
    /// Returns `None` only when `filter` matches no template.
    pub fn pick_random<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        filter: Option<MessageKind>,
    ) -> Option<&MessageTemplate> {
        match filter {
            None => self.templates.choose(rng),
            Some(kind) => {
                let candidates: Vec<&MessageTemplate> =
                    self.templates.iter().filter(|t| t.kind == kind).collect();
                candidates.choose(rng).copied()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&MessageTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn templates(&self) -> &[MessageTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn count_kind(&self, kind: MessageKind) -> usize {
        self.templates.iter().filter(|t| t.kind == kind).count()
    }
}

impl Default for MessagePool {
    fn default() -> Self {
        Self::reference()
    }
}

fn normalize_template(mut t: MessageTemplate) -> Result<MessageTemplate, String> {
    if t.id.trim().is_empty() {
        return Err("template id is empty".to_string());
    }
    if t.text.trim().is_empty() {
        return Err(format!("template '{}' has no text", t.id));
    }

    match t.kind {
        MessageKind::Legal => {
            if t.law_label.as_deref().map_or(true, |l| l.trim().is_empty()) {
                return Err(format!("legal template '{}' has no law label", t.id));
            }
            if t.escalation_delay_ms.is_none() {
                t.escalation_delay_ms = Some(DEFAULT_ESCALATION_DELAY_MS);
            }
            t.subkind = None;
        }
        MessageKind::Distraction => {
            t.escalation_delay_ms = None;
            t.law_label = None;
        }
    }

    Ok(t)
}
