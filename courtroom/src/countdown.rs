//! Session countdown shown alongside the message queue.
//!
//! Setup → Running ⇄ Paused → Expired, with stop/reset returning to setup.
//! Time is supplied by the caller in milliseconds, like the rest of the crate.

use serde::{Deserialize, Serialize};

/// Largest minutes value accepted in setup
pub const MAX_MINUTES: u32 = 99;
/// Largest seconds value accepted in setup
pub const MAX_SECONDS: u32 = 59;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownPhase {
    Setup,
    Running,
    Paused,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownTimer {
    minutes: u32,
    seconds: u32,
    phase: CountdownPhase,
    /// Remaining time at the last start/resume/pause
    remaining_ms: u64,
    /// Clock reading when the timer last started running
    running_since: Option<u64>,
}

impl CountdownTimer {
    /// A timer in setup mode with `minutes:seconds` (clamped) on the dial.
    pub fn new(minutes: u32, seconds: u32) -> Self {
        let mut timer = Self {
            minutes: 0,
            seconds: 0,
            phase: CountdownPhase::Setup,
            remaining_ms: 0,
            running_since: None,
        };
        timer.set_duration(minutes, seconds);
        timer
    }

    /// Change the dial. Ignored unless in setup mode.
    pub fn set_duration(&mut self, minutes: u32, seconds: u32) {
        if self.phase != CountdownPhase::Setup {
            return;
        }
        self.minutes = minutes.min(MAX_MINUTES);
        self.seconds = seconds.min(MAX_SECONDS);
        self.remaining_ms = self.configured_ms();
    }

    /// Begin counting down from the dial. Does nothing on a zero dial or
    /// outside setup mode.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.phase != CountdownPhase::Setup || self.configured_ms() == 0 {
            return false;
        }
        self.remaining_ms = self.configured_ms();
        self.running_since = Some(now_ms);
        self.phase = CountdownPhase::Running;
        true
    }

    pub fn pause(&mut self, now_ms: u64) {
        if self.phase != CountdownPhase::Running {
            return;
        }
        self.remaining_ms = self.remaining_ms_at(now_ms);
        self.running_since = None;
        self.phase = CountdownPhase::Paused;
    }

    pub fn resume(&mut self, now_ms: u64) {
        if self.phase != CountdownPhase::Paused {
            return;
        }
        self.running_since = Some(now_ms);
        self.phase = CountdownPhase::Running;
    }

    /// Back to setup with the dial's full duration.
    pub fn stop_and_reset(&mut self) {
        self.phase = CountdownPhase::Setup;
        self.running_since = None;
        self.remaining_ms = self.configured_ms();
    }

    /// Returns true exactly once, on the poll that sees the timer run out.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.phase != CountdownPhase::Running || self.remaining_ms_at(now_ms) > 0 {
            return false;
        }
        self.remaining_ms = 0;
        self.running_since = None;
        self.phase = CountdownPhase::Expired;
        true
    }

    /// Remaining time in whole seconds, rounded up so "00:00" only shows
    /// once the timer has actually run out.
    pub fn remaining_secs(&self, now_ms: u64) -> u64 {
        self.remaining_ms_at(now_ms).div_ceil(1_000)
    }

    pub fn remaining_ms_at(&self, now_ms: u64) -> u64 {
        match self.running_since {
            Some(since) => self
                .remaining_ms
                .saturating_sub(now_ms.saturating_sub(since)),
            None => self.remaining_ms,
        }
    }

    /// `MM:SS` for the current remaining time.
    pub fn display(&self, now_ms: u64) -> String {
        format_mm_ss(self.remaining_secs(now_ms))
    }

    pub fn phase(&self) -> CountdownPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == CountdownPhase::Running
    }

    pub fn configured_ms(&self) -> u64 {
        (u64::from(self.minutes) * 60 + u64::from(self.seconds)) * 1_000
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(5, 0)
    }
}

/// Zero-padded `MM:SS`.
pub fn format_mm_ss(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
