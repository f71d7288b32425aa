//! Court Room Simulation runtime
//!
//! Runs the deterministic [`courtroom`] engine on tokio timers and exposes
//! it to a player through a line-based terminal session.
//!
//! - [`config`]: layered TOML/env configuration
//! - [`runtime`]: background driver task with start/stop lifecycle
//! - [`session`]: countdown, stages and player commands
//! - [`telemetry`]: tracing subscriber setup

pub mod config;
pub mod runtime;
pub mod session;
pub mod telemetry;

pub use config::{SimConfig, TemplateConfig};
pub use runtime::{RuntimeError, SharedSimulation, SimulationRunner, TokioClock};
pub use session::{Command, Flow, Session};
