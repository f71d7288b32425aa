//! Simulation configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then `COURT_*`
//! environment variables, then CLI flags (applied by the binary). Numeric
//! fields are signed so a hand-edited file with a negative delay still loads;
//! negatives are clamped to zero when the config is turned into engine types.

use std::path::Path;

use anyhow::{Context, Result};
use courtroom::{
    clamp_ms, CountdownTimer, CourtResult, DistractionKind, EscalationConfig, IntervalRange,
    MessageKind, MessagePool, MessageTemplate, SchedulePolicy, SimulationConfig,
};
use serde::{Deserialize, Serialize};

/// A message template as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub id: String,
    pub text: String,
    pub kind: MessageKind,
    #[serde(default)]
    pub subkind: Option<DistractionKind>,
    #[serde(default)]
    pub escalation_delay_ms: Option<i64>,
    #[serde(default)]
    pub law_label: Option<String>,
}

impl From<&TemplateConfig> for MessageTemplate {
    fn from(t: &TemplateConfig) -> Self {
        MessageTemplate {
            id: t.id.clone(),
            text: t.text.clone(),
            kind: t.kind,
            subkind: t.subkind,
            escalation_delay_ms: t.escalation_delay_ms.map(clamp_ms),
            law_label: t.law_label.clone(),
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Shortest wait between scheduled messages
    pub schedule_min_ms: i64,
    /// Longest wait between scheduled messages
    pub schedule_max_ms: i64,
    /// Escalation scan period
    pub tick_ms: i64,
    /// How long a message stays urgent before the fine lands
    pub fine_window_ms: i64,
    /// Delay for legal templates that do not carry their own
    pub default_escalation_ms: i64,
    pub urgent_marker: String,
    /// Restrict scheduling to one message kind
    pub only: Option<MessageKind>,
    pub seed: Option<u64>,
    pub countdown_minutes: u32,
    pub countdown_seconds: u32,
    /// Replaces the built-in catalog when non-empty
    pub templates: Vec<TemplateConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let escalation = EscalationConfig::default();
        let interval = IntervalRange::default();
        Self {
            schedule_min_ms: interval.min_ms as i64,
            schedule_max_ms: interval.max_ms as i64,
            tick_ms: escalation.tick_interval_ms as i64,
            fine_window_ms: escalation.second_escalation_delay_ms as i64,
            default_escalation_ms: escalation.default_escalation_delay_ms as i64,
            urgent_marker: escalation.urgent_marker,
            only: None,
            seed: None,
            countdown_minutes: 5,
            countdown_seconds: 0,
            templates: Vec::new(),
        }
    }
}

impl SimConfig {
    /// Defaults, then `path` (if given), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `COURT_*` overrides looked up through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
        where
            T::Err: std::fmt::Display,
        {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{key}={value:?}: {e}"))
        }

        if let Some(v) = lookup("COURT_SCHEDULE_MIN_MS") {
            self.schedule_min_ms = parse("COURT_SCHEDULE_MIN_MS", &v)?;
        }
        if let Some(v) = lookup("COURT_SCHEDULE_MAX_MS") {
            self.schedule_max_ms = parse("COURT_SCHEDULE_MAX_MS", &v)?;
        }
        if let Some(v) = lookup("COURT_TICK_MS") {
            self.tick_ms = parse("COURT_TICK_MS", &v)?;
        }
        if let Some(v) = lookup("COURT_FINE_WINDOW_MS") {
            self.fine_window_ms = parse("COURT_FINE_WINDOW_MS", &v)?;
        }
        if let Some(v) = lookup("COURT_SEED") {
            self.seed = Some(parse("COURT_SEED", &v)?);
        }
        Ok(())
    }

    /// Engine-facing configuration with every delay clamped to zero or more.
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            interval: IntervalRange::from_signed(self.schedule_min_ms, self.schedule_max_ms),
            policy: match self.only {
                Some(kind) => SchedulePolicy::OnlyKind(kind),
                None => SchedulePolicy::AnyKind,
            },
            escalation: EscalationConfig {
                tick_interval_ms: clamp_ms(self.tick_ms),
                second_escalation_delay_ms: clamp_ms(self.fine_window_ms),
                default_escalation_delay_ms: clamp_ms(self.default_escalation_ms),
                urgent_marker: self.urgent_marker.clone(),
            },
            seed: self.seed,
        }
    }

    /// The configured catalog, or the built-in one when none is given.
    pub fn pool(&self) -> CourtResult<MessagePool> {
        if self.templates.is_empty() {
            return Ok(MessagePool::reference());
        }
        let default_delay = clamp_ms(self.default_escalation_ms);
        MessagePool::new(self.templates.iter().map(|t| {
            let mut template = MessageTemplate::from(t);
            if template.kind == MessageKind::Legal && template.escalation_delay_ms.is_none() {
                template.escalation_delay_ms = Some(default_delay);
            }
            template
        }))
    }

    pub fn countdown(&self) -> CountdownTimer {
        CountdownTimer::new(self.countdown_minutes, self.countdown_seconds)
    }
}
