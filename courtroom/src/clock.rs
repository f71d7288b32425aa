//! Time sources for the simulation.
//!
//! Every component reads time through [`Clock`] so tests can drive the whole
//! state machine with a [`ManualClock`] instead of waiting on wall time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Millisecond time source.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds. Only differences are meaningful.
    fn now_ms(&self) -> u64;
}

/// Wall clock: milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
    }
}

/// Virtual clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the simulation.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    /// Move forward by `delta_ms` and return the new time.
    pub fn advance(&self, delta_ms: u64) -> u64 {
        self.now
            .fetch_add(delta_ms, Ordering::SeqCst)
            .wrapping_add(delta_ms)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
