//! Simulation: owns the scheduler, the escalation engine and the active set
//!
//! The simulation never sleeps. A host (a tokio task, a game loop, a test)
//! calls [`Simulation::pump`] whenever [`Simulation::next_deadline`] says
//! something is due, and the simulation does whatever the injected clock
//! says has come due.
//!
//! ```text
//! Scheduler ──▶ MessagePool ──▶ ActiveSet ◀── EscalationEngine (tick)
//!                                   │                  │
//!                                   ▼                  ▼
//!                            on_snapshot         on_escalated ──▶ host UI
//! ```

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::engine::{EscalationConfig, EscalationEngine, Transition};
use crate::error::{CourtError, CourtResult};
use crate::events::CourtEvent;
use crate::message::{ActiveMessage, MessageTemplate, OccurrenceId, Severity};
use crate::pool::MessagePool;
use crate::queue::{ActiveSet, Dismissal};
use crate::scheduler::{IntervalRange, SchedulePolicy, Scheduler};

/// Host-side collaborators notified by the simulation.
///
/// All methods default to no-ops so observers only implement what they
/// need. Callbacks run synchronously inside `pump`/`dismiss` and must not
/// call back into the simulation.
pub trait CourtObserver: Send + Sync {
    /// A legal message escalated: a fine was incurred under `law_label`.
    fn on_escalated(&self, _law_label: &str) {}

    /// The player dismissed an escalated message.
    fn on_acknowledged(&self) {}

    /// The active set changed; `messages` is the full new set.
    fn on_snapshot(&self, _messages: &[ActiveMessage]) {}

    /// Every state change, as a structured event.
    fn on_event(&self, _event: &CourtEvent) {}
}

/// Tunables for a simulation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub interval: IntervalRange,
    pub policy: SchedulePolicy,
    pub escalation: EscalationConfig,
    /// Fixed RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval: IntervalRange::default(),
            policy: SchedulePolicy::default(),
            escalation: EscalationConfig::default(),
            seed: None,
        }
    }
}

/// What one `pump` did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpReport {
    pub enqueued: Vec<OccurrenceId>,
    pub transitions: Vec<Transition>,
    pub ticked: bool,
}

impl PumpReport {
    pub fn fines(&self) -> usize {
        self.transitions.iter().filter(|t| t.is_fine()).count()
    }
}

/// The court room message simulation
pub struct Simulation<C: Clock> {
    clock: C,
    pool: MessagePool,
    scheduler: Scheduler,
    engine: EscalationEngine,
    active: ActiveSet,
    rng: StdRng,
    observers: Vec<Arc<dyn CourtObserver>>,
    next_tick_at: Option<u64>,
}

impl<C: Clock> Simulation<C> {
    pub fn new(clock: C, pool: MessagePool, config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            clock,
            pool,
            scheduler: Scheduler::new(config.interval, config.policy),
            engine: EscalationEngine::with_config(config.escalation),
            active: ActiveSet::new(),
            rng,
            observers: Vec::new(),
            next_tick_at: None,
        }
    }

    /// Register an observer. Observers are notified in registration order.
    pub fn add_observer(&mut self, observer: Arc<dyn CourtObserver>) {
        self.observers.push(observer);
    }

    /// Arm the scheduler and the tick cadence. No-op while running.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("Simulation already running");
            return;
        }
        let now = self.clock.now_ms();
        self.scheduler.start(now, &mut self.rng);
        self.next_tick_at = Some(now.saturating_add(self.tick_interval()));
        info!(
            now,
            next_fire_at = ?self.scheduler.next_fire_at(),
            tick_ms = self.tick_interval(),
            "Simulation started"
        );
    }

    /// Disarm both activities. Safe to call repeatedly or before `start`.
    ///
    /// Active messages stay in place; use [`Simulation::reset`] to drop them.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.scheduler.stop();
        self.next_tick_at = None;
        info!(active = self.active.len(), "Simulation stopped");
    }

    /// Stop and drop every active message.
    pub fn reset(&mut self) {
        self.stop();
        if !self.active.is_empty() {
            self.active.clear();
            self.notify_snapshot();
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_tick_at.is_some()
    }

    /// Run everything due at the current clock reading.
    ///
    /// At most one scheduler firing, then every tick boundary up to `now`,
    /// each evaluated at its own boundary time. A late host therefore
    /// records `urgent_since` at the boundary where the delay ran out, not
    /// at the time it got around to pumping.
    pub fn pump(&mut self) -> PumpReport {
        let mut report = PumpReport::default();
        if !self.is_running() {
            return report;
        }
        let now = self.clock.now_ms();

        if let Some(template) = self.scheduler.poll(now, &self.pool, &mut self.rng) {
            report.enqueued.push(self.insert(template, now));
        }

        let interval = self.tick_interval();
        while let Some(at) = self.next_tick_at.filter(|&at| at <= now) {
            report.transitions.extend(self.run_tick(at));
            report.ticked = true;
            self.next_tick_at = Some(at.saturating_add(interval));
        }

        report
    }

    /// Run one escalation scan right now, whatever the cadence says.
    pub fn tick_now(&mut self) -> Vec<Transition> {
        let now = self.clock.now_ms();
        self.run_tick(now)
    }

    /// Draw and enqueue a template right now, as if the scheduler fired.
    pub fn fire_now(&mut self) -> Option<OccurrenceId> {
        let now = self.clock.now_ms();
        let template = self
            .pool
            .pick_random(&mut self.rng, self.scheduler.policy().kind_filter())?
            .clone();
        Some(self.insert(template, now))
    }

    /// Enqueue a specific template by id.
    pub fn enqueue(&mut self, template_id: &str) -> CourtResult<OccurrenceId> {
        let template = self
            .pool
            .get(template_id)
            .cloned()
            .ok_or_else(|| CourtError::UnknownTemplate(template_id.to_string()))?;
        let now = self.clock.now_ms();
        Ok(self.insert(template, now))
    }

    /// Remove a message. Dismissing an escalated message acknowledges its fine.
    pub fn dismiss(&mut self, occurrence: OccurrenceId) -> CourtResult<Dismissal> {
        let dismissal = self.active.dismiss(occurrence)?;
        let now = self.clock.now_ms();
        let msg = &dismissal.message;

        self.emit(&CourtEvent::MessageDismissed {
            occurrence,
            template_id: msg.template.id.clone(),
            severity: msg.severity,
            at_ms: now,
        });
        if dismissal.fine_acknowledged {
            self.emit(&CourtEvent::FineAcknowledged {
                occurrence,
                law_label: msg.law_label().unwrap_or_default().to_string(),
                at_ms: now,
            });
            for observer in &self.observers {
                observer.on_acknowledged();
            }
        }
        self.notify_snapshot();
        Ok(dismissal)
    }

    /// Earliest time at which `pump` has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.next_tick_at, self.scheduler.next_fire_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn snapshot(&self) -> Vec<ActiveMessage> {
        self.active.snapshot()
    }

    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    pub fn pool(&self) -> &MessagePool {
        &self.pool
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn engine(&self) -> &EscalationEngine {
        &self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn tick_interval(&self) -> u64 {
        self.engine.config().tick_interval_ms.max(1)
    }

    fn insert(&mut self, template: MessageTemplate, now: u64) -> OccurrenceId {
        let kind = template.kind;
        let template_id = template.id.clone();
        let occurrence = self.active.enqueue(template, now);
        self.emit(&CourtEvent::MessageEnqueued {
            occurrence,
            template_id,
            kind,
            at_ms: now,
        });
        self.notify_snapshot();
        occurrence
    }

    fn run_tick(&mut self, now: u64) -> Vec<Transition> {
        let transitions = self.active.apply_tick(&self.engine, now);
        if transitions.is_empty() {
            return transitions;
        }

        for t in &transitions {
            match t.to {
                Severity::Urgent => self.emit(&CourtEvent::MessageUrgent {
                    occurrence: t.occurrence,
                    template_id: t.template_id.clone(),
                    at_ms: t.at,
                }),
                Severity::Escalated => {
                    let law = t.law_label.as_deref().unwrap_or_default();
                    for observer in &self.observers {
                        observer.on_escalated(law);
                    }
                    self.emit(&CourtEvent::FineIncurred {
                        occurrence: t.occurrence,
                        law_label: law.to_string(),
                        at_ms: t.at,
                    });
                }
                Severity::Normal => {}
            }
        }
        self.notify_snapshot();
        transitions
    }

    fn emit(&self, event: &CourtEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }

    fn notify_snapshot(&self) {
        let messages = self.active.messages();
        for observer in &self.observers {
            observer.on_snapshot(messages);
        }
    }
}
