//! Stage progression for the court room session.

use serde::{Deserialize, Serialize};

/// One of the three session stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stage(u8);

impl Stage {
    pub const FIRST: Stage = Stage(1);
    pub const LAST: Stage = Stage(3);

    /// Clamp `n` into the valid stage range.
    pub fn clamped(n: u8) -> Self {
        Self(n.clamp(Self::FIRST.0, Self::LAST.0))
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self::clamped(self.0.saturating_add(1))
    }

    pub fn previous(&self) -> Self {
        Self::clamped(self.0.saturating_sub(1))
    }

    pub fn description(&self) -> &'static str {
        match self.0 {
            1 => "Debug the code",
            2 => "Continue debugging and watch for messages",
            _ => "Fix accessibility and security issues",
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::FIRST
    }
}

impl TryFrom<u8> for Stage {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        if (Self::FIRST.0..=Self::LAST.0).contains(&n) {
            Ok(Self(n))
        } else {
            Err(format!("stage must be between 1 and 3, got {n}"))
        }
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> u8 {
        stage.0
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stage {}: {}", self.0, self.description())
    }
}

/// Tracks the current stage and reports whether moves changed it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTracker {
    current: Stage,
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// Move forward. Returns `(from, to)` if the stage changed.
    pub fn advance(&mut self) -> Option<(Stage, Stage)> {
        self.move_to(self.current.next())
    }

    /// Move back. Returns `(from, to)` if the stage changed.
    pub fn retreat(&mut self) -> Option<(Stage, Stage)> {
        self.move_to(self.current.previous())
    }

    pub fn can_advance(&self) -> bool {
        self.current < Stage::LAST
    }

    pub fn can_retreat(&self) -> bool {
        self.current > Stage::FIRST
    }

    fn move_to(&mut self, to: Stage) -> Option<(Stage, Stage)> {
        let from = self.current;
        if from == to {
            return None;
        }
        self.current = to;
        Some((from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_clamps() {
        assert_eq!(Stage::clamped(0), Stage::FIRST);
        assert_eq!(Stage::clamped(9), Stage::LAST);
        assert_eq!(Stage::LAST.next(), Stage::LAST);
        assert_eq!(Stage::FIRST.previous(), Stage::FIRST);
    }

    #[test]
    fn test_tracker_moves() {
        let mut tracker = StageTracker::new();
        assert!(!tracker.can_retreat());
        assert_eq!(tracker.retreat(), None);

        assert_eq!(tracker.advance(), Some((Stage::FIRST, Stage::clamped(2))));
        assert_eq!(tracker.advance(), Some((Stage::clamped(2), Stage::LAST)));
        assert_eq!(tracker.advance(), None);
        assert!(!tracker.can_advance());
        assert_eq!(tracker.current().number(), 3);
    }

    #[test]
    fn test_stage_serde_validates() {
        assert_eq!(serde_json::to_string(&Stage::LAST).unwrap(), "3");
        assert!(serde_json::from_str::<Stage>("4").is_err());
        assert_eq!(serde_json::from_str::<Stage>("2").unwrap().number(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(Stage::FIRST.to_string(), "Stage 1: Debug the code");
    }
}
