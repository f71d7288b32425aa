//! Tokio driver for a [`Simulation`].
//!
//! One background task sleeps until the simulation's next deadline, pumps
//! it, and repeats. Stopping cancels the task through a
//! [`CancellationToken`] and disarms the simulation, so no stale timer can
//! fire after a restart.
//!
//! # Usage
//!
//! ```ignore
//! let sim = Simulation::new(TokioClock::new(), MessagePool::reference(), config);
//! let mut runner = SimulationRunner::new(sim);
//! runner.start()?;
//! // ...
//! runner.stop().await;
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use courtroom::{ActiveMessage, Clock, CourtError, Dismissal, OccurrenceId, Simulation};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Clock backed by tokio's time source, so paused-time tests move it.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Errors from the runtime driver
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Simulation state lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Court(#[from] CourtError),
}

/// Simulation shared between the driver task and the front-end
pub type SharedSimulation = Arc<Mutex<Simulation<TokioClock>>>;

/// Owns the background task driving a simulation
pub struct SimulationRunner {
    sim: SharedSimulation,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl SimulationRunner {
    pub fn new(sim: Simulation<TokioClock>) -> Self {
        Self {
            sim: Arc::new(Mutex::new(sim)),
            cancel: None,
            task: None,
        }
    }

    pub fn shared(&self) -> SharedSimulation {
        self.sim.clone()
    }

    /// Start the simulation and its driver task. No-op while running.
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        if self.cancel.is_some() {
            debug!("Runner already started");
            return Ok(());
        }
        self.lock()?.start();

        let cancel = CancellationToken::new();
        self.task = Some(tokio::spawn(drive(self.sim.clone(), cancel.clone())));
        self.cancel = Some(cancel);
        info!("Simulation runner started");
        Ok(())
    }

    /// Cancel the driver task and disarm the simulation.
    ///
    /// Idempotent, and safe if `start` was never called.
    pub async fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Simulation driver task ended abnormally: {e}");
            }
            info!("Simulation runner stopped");
        }
        match self.sim.lock() {
            Ok(mut sim) => sim.stop(),
            Err(_) => warn!("Simulation lock poisoned during stop"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn dismiss(&self, occurrence: OccurrenceId) -> Result<Dismissal, RuntimeError> {
        Ok(self.lock()?.dismiss(occurrence)?)
    }

    pub fn snapshot(&self) -> Result<Vec<ActiveMessage>, RuntimeError> {
        Ok(self.lock()?.snapshot())
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Simulation<TokioClock>>, RuntimeError> {
        self.sim.lock().map_err(|_| RuntimeError::LockPoisoned)
    }
}

impl Drop for SimulationRunner {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}

/// Sleep until the next deadline, pump, repeat.
async fn drive(sim: SharedSimulation, cancel: CancellationToken) {
    loop {
        let wait = {
            let Ok(guard) = sim.lock() else {
                warn!("Simulation lock poisoned, driver exiting");
                return;
            };
            match guard.next_deadline() {
                Some(at) => Duration::from_millis(at.saturating_sub(guard.now_ms())),
                None => {
                    debug!("Simulation disarmed, driver exiting");
                    return;
                }
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Simulation driver cancelled");
                return;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        let Ok(mut guard) = sim.lock() else {
            warn!("Simulation lock poisoned, driver exiting");
            return;
        };
        let report = guard.pump();
        if !report.enqueued.is_empty() || !report.transitions.is_empty() {
            debug!(
                enqueued = report.enqueued.len(),
                transitions = report.transitions.len(),
                fines = report.fines(),
                "Pumped simulation"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtroom::{MessagePool, SimulationConfig};

    fn runner() -> SimulationRunner {
        SimulationRunner::new(Simulation::new(
            TokioClock::new(),
            MessagePool::reference(),
            SimulationConfig {
                seed: Some(1),
                ..Default::default()
            },
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock::new();
        assert_eq!(clock.now_ms(), 0);
        tokio::time::advance(Duration::from_millis(1_500)).await;
        assert_eq!(clock.now_ms(), 1_500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_without_start_is_safe() {
        let mut r = runner();
        r.stop().await;
        r.stop().await;
        assert!(!r.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let mut r = runner();
        r.start().unwrap();
        r.start().unwrap();
        assert!(r.is_running());
        r.stop().await;
        assert!(!r.is_running());
        assert!(!r.lock().unwrap().is_running());
    }
}
