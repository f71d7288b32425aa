//! Scheduler: injects messages at randomized intervals
//!
//! The scheduler owns a single pending deadline. It never waits itself: the
//! host polls it with the current time and it fires at most once per poll,
//! re-arming immediately with a fresh draw.
//!
//! ```text
//! stop ──start──▶ armed(deadline) ──poll(now ≥ deadline)──▶ fire + re-arm
//!   ▲                 │
//!   └──────stop───────┘
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::message::{MessageKind, MessageTemplate};
use crate::pool::MessagePool;

/// Reference lower bound between firings
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 20_000;
/// Reference upper bound between firings
pub const DEFAULT_MAX_INTERVAL_MS: u64 = 30_000;
/// Shortest possible gap between firings, even for a `[0, 0]` range
pub const MIN_REARM_MS: u64 = 1;

/// Inclusive range of delays between firings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl IntervalRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        if min_ms <= max_ms {
            Self { min_ms, max_ms }
        } else {
            Self {
                min_ms: max_ms,
                max_ms: min_ms,
            }
        }
    }

    /// Build a range from signed host input, clamping negatives to zero.
    pub fn from_signed(min_ms: i64, max_ms: i64) -> Self {
        Self::new(clamp_ms(min_ms), clamp_ms(max_ms))
    }

    /// Draw a delay uniformly from `[min_ms, max_ms]`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.gen_range(self.min_ms..=self.max_ms)
    }
}

impl Default for IntervalRange {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL_MS, DEFAULT_MAX_INTERVAL_MS)
    }
}

/// Clamp a signed millisecond value to zero.
pub fn clamp_ms(ms: i64) -> u64 {
    u64::try_from(ms).unwrap_or(0)
}

/// Which templates a firing may draw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy", content = "kind")]
pub enum SchedulePolicy {
    /// Draw from the whole pool
    #[default]
    AnyKind,
    /// Draw only templates of one kind
    OnlyKind(MessageKind),
}

impl SchedulePolicy {
    /// Kind restriction to hand to [`MessagePool::pick_random`].
    pub fn kind_filter(&self) -> Option<MessageKind> {
        match self {
            Self::AnyKind => None,
            Self::OnlyKind(kind) => Some(*kind),
        }
    }
}

/// Randomized, self-re-arming message scheduler
#[derive(Debug, Clone)]
pub struct Scheduler {
    range: IntervalRange,
    policy: SchedulePolicy,
    next_fire_at: Option<u64>,
    /// Bumped on every start/stop so a host can discard stale timers
    generation: u64,
    fired: u64,
}

impl Scheduler {
    pub fn new(range: IntervalRange, policy: SchedulePolicy) -> Self {
        Self {
            range,
            policy,
            next_fire_at: None,
            generation: 0,
            fired: 0,
        }
    }

    /// Arm the first deadline. Calling this while running restarts the
    /// sequence with a fresh draw.
    pub fn start<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R) {
        self.generation += 1;
        let deadline = self.rearm_at(now_ms, rng);
        self.next_fire_at = Some(deadline);
        debug!(
            generation = self.generation,
            next_fire_at = deadline,
            "Scheduler armed"
        );
    }

    /// Cancel the pending deadline. Safe to call repeatedly or before `start`.
    pub fn stop(&mut self) {
        if self.next_fire_at.take().is_some() {
            self.generation += 1;
            debug!(generation = self.generation, "Scheduler stopped");
        }
    }

    /// Fire if the deadline has passed.
    ///
    /// Returns the drawn template and re-arms relative to `now_ms`. Returns
    /// `None` when not running, not yet due, or when the policy matches no
    /// template (the firing is skipped, the loop keeps going).
    pub fn poll<R: Rng + ?Sized>(
        &mut self,
        now_ms: u64,
        pool: &MessagePool,
        rng: &mut R,
    ) -> Option<MessageTemplate> {
        let deadline = self.next_fire_at?;
        if now_ms < deadline {
            return None;
        }

        let picked = pool.pick_random(rng, self.policy.kind_filter()).cloned();
        self.next_fire_at = Some(self.rearm_at(now_ms, rng));
        self.fired += 1;

        match &picked {
            Some(t) => debug!(id = %t.id, next_fire_at = ?self.next_fire_at, "Scheduler fired"),
            None => debug!(policy = ?self.policy, "Scheduler fired with no matching template"),
        }
        picked
    }

    pub fn is_running(&self) -> bool {
        self.next_fire_at.is_some()
    }

    fn rearm_at<R: Rng + ?Sized>(&self, now_ms: u64, rng: &mut R) -> u64 {
        now_ms.saturating_add(self.range.draw(rng).max(MIN_REARM_MS))
    }

    pub fn next_fire_at(&self) -> Option<u64> {
        self.next_fire_at
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total firings since construction.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn range(&self) -> IntervalRange {
        self.range
    }

    pub fn policy(&self) -> SchedulePolicy {
        self.policy
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(IntervalRange::default(), SchedulePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    #[test]
    fn test_interval_range_normalizes() {
        assert_eq!(IntervalRange::new(30, 20), IntervalRange::new(20, 30));
        assert_eq!(IntervalRange::from_signed(-5, 10), IntervalRange::new(0, 10));
        assert_eq!(IntervalRange::from_signed(-5, -1), IntervalRange::new(0, 0));
    }

    #[test]
    fn test_draw_stays_in_range() {
        let range = IntervalRange::default();
        let mut rng = rng();
        for _ in 0..200 {
            let d = range.draw(&mut rng);
            assert!((20_000..=30_000).contains(&d));
        }
    }

    #[test]
    fn test_not_running_never_fires() {
        let mut s = Scheduler::default();
        let pool = MessagePool::reference();
        assert!(!s.is_running());
        assert!(s.poll(u64::MAX, &pool, &mut rng()).is_none());
    }

    #[test]
    fn test_fires_at_deadline_and_rearms() {
        let mut s = Scheduler::new(IntervalRange::new(1_000, 1_000), SchedulePolicy::AnyKind);
        let pool = MessagePool::reference();
        let mut rng = rng();

        s.start(0, &mut rng);
        assert_eq!(s.next_fire_at(), Some(1_000));
        assert!(s.poll(999, &pool, &mut rng).is_none());
        assert!(s.poll(1_000, &pool, &mut rng).is_some());
        assert_eq!(s.next_fire_at(), Some(2_000));
        assert_eq!(s.fired(), 1);
    }

    #[test]
    fn test_fires_once_per_poll_even_when_late() {
        let mut s = Scheduler::new(IntervalRange::new(1_000, 1_000), SchedulePolicy::AnyKind);
        let pool = MessagePool::reference();
        let mut rng = rng();

        s.start(0, &mut rng);
        assert!(s.poll(10_000, &pool, &mut rng).is_some());
        assert_eq!(s.next_fire_at(), Some(11_000));
        assert!(s.poll(10_000, &pool, &mut rng).is_none());
    }

    #[test]
    fn test_stop_is_idempotent_and_restart_is_fresh() {
        let mut s = Scheduler::new(IntervalRange::new(500, 500), SchedulePolicy::AnyKind);
        let pool = MessagePool::reference();
        let mut rng = rng();

        s.stop();
        assert_eq!(s.generation(), 0);

        s.start(0, &mut rng);
        let first_gen = s.generation();
        s.stop();
        s.stop();
        assert!(!s.is_running());
        assert_eq!(s.generation(), first_gen + 1);
        assert!(s.poll(500, &pool, &mut rng).is_none());

        s.start(10_000, &mut rng);
        assert_eq!(s.next_fire_at(), Some(10_500));
        assert!(s.generation() > first_gen + 1);
    }

    #[test]
    fn test_only_kind_policy() {
        let mut s = Scheduler::new(
            IntervalRange::new(0, 0),
            SchedulePolicy::OnlyKind(MessageKind::Distraction),
        );
        let pool = MessagePool::reference();
        let mut rng = rng();
        s.start(0, &mut rng);
        for now in 1..=30 {
            let t = s.poll(now, &pool, &mut rng).unwrap();
            assert_eq!(t.kind, MessageKind::Distraction);
        }
    }

    #[test]
    fn test_zero_range_still_advances_time() {
        let mut s = Scheduler::new(IntervalRange::from_signed(-100, -1), SchedulePolicy::AnyKind);
        let pool = MessagePool::reference();
        let mut rng = rng();

        s.start(5, &mut rng);
        assert_eq!(s.next_fire_at(), Some(6));
        assert!(s.poll(5, &pool, &mut rng).is_none());
        assert!(s.poll(6, &pool, &mut rng).is_some());
        assert_eq!(s.next_fire_at(), Some(7));
        assert!(s.poll(6, &pool, &mut rng).is_none());
    }
}
