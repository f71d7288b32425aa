//! Court Room Simulation Engine
//!
//! Deterministic core of the court room teaching game: a scheduler drops
//! legal and distraction messages into an active set at random intervals,
//! and an escalation engine promotes ignored legal messages from normal to
//! urgent to a fine.
//!
//! # Components
//!
//! - [`pool::MessagePool`]: the catalog of message templates
//! - [`scheduler::Scheduler`]: randomized, restartable enqueue loop
//! - [`engine::EscalationEngine`]: pure tick function over the active set
//! - [`queue::ActiveSet`]: live occurrences and dismissal
//! - [`simulation::Simulation`]: owns all of the above behind one clock
//! - [`countdown::CountdownTimer`] and [`stage::StageTracker`]: session chrome
//!
//! Nothing here sleeps or spawns. Time comes from a [`clock::Clock`], so
//! tests drive everything with a [`clock::ManualClock`].
//!
//! # Usage
//!
//! ```ignore
//! use courtroom::{ManualClock, MessagePool, Simulation, SimulationConfig};
//!
//! let clock = ManualClock::new(0);
//! let mut sim = Simulation::new(clock.clone(), MessagePool::reference(), SimulationConfig::default());
//! sim.start();
//!
//! clock.advance(30_000);
//! let report = sim.pump();
//! ```

pub mod clock;
pub mod countdown;
pub mod engine;
pub mod error;
pub mod events;
pub mod message;
pub mod pool;
pub mod presentation;
pub mod queue;
pub mod scheduler;
pub mod simulation;
pub mod stage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use countdown::{format_mm_ss, CountdownPhase, CountdownTimer};
pub use engine::{EscalationConfig, EscalationEngine, TickOutcome, Transition};
pub use error::{CourtError, CourtResult};
pub use events::{CourtEvent, EventBus, EventBusObserver, SharedEventBus};
pub use message::{
    ActiveMessage, DistractionKind, MessageKind, MessageTemplate, OccurrenceId, Severity,
};
pub use pool::MessagePool;
pub use presentation::{AlertTone, AlertView};
pub use queue::{ActiveSet, Dismissal};
pub use scheduler::{clamp_ms, IntervalRange, SchedulePolicy, Scheduler};
pub use simulation::{CourtObserver, PumpReport, Simulation, SimulationConfig};
pub use stage::{Stage, StageTracker};
