//! Player session: the runner plus the countdown and stage controls, driven
//! by text commands.

use courtroom::{
    AlertView, CountdownPhase, CountdownTimer, CourtEvent, OccurrenceId, SharedEventBus,
    StageTracker,
};
use tracing::info;

use crate::runtime::{RuntimeError, SimulationRunner};

/// One line of player input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Dismiss the message with this occurrence number
    Dismiss(u64),
    NextStage,
    PreviousStage,
    /// Start, pause or resume the countdown depending on its phase
    ToggleCountdown,
    ResetCountdown,
    Status,
    Help,
    Quit,
}

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or_else(|| "empty command".to_string())?;
        let cmd = match verb.to_ascii_lowercase().as_str() {
            "d" | "dismiss" => {
                let raw = parts
                    .next()
                    .ok_or_else(|| "usage: d <message number>".to_string())?;
                let n = raw
                    .trim_start_matches('#')
                    .parse::<u64>()
                    .map_err(|_| format!("not a message number: {raw}"))?;
                Command::Dismiss(n)
            }
            "n" | "next" => Command::NextStage,
            "p" | "prev" | "previous" => Command::PreviousStage,
            "t" | "timer" => Command::ToggleCountdown,
            "r" | "reset" => Command::ResetCountdown,
            "s" | "status" => Command::Status,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{other}' (h for help)")),
        };
        Ok(cmd)
    }
}

pub const HELP: &str = "commands: d <n> dismiss | n/p next/previous stage | t start/pause timer | r reset timer | s status | q quit";

/// Whether the input loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    runner: SimulationRunner,
    countdown: CountdownTimer,
    stages: StageTracker,
    bus: SharedEventBus,
}

impl Session {
    pub fn new(runner: SimulationRunner, countdown: CountdownTimer, bus: SharedEventBus) -> Self {
        Self {
            runner,
            countdown,
            stages: StageTracker::new(),
            bus,
        }
    }

    pub fn start(&mut self) -> Result<(), RuntimeError> {
        self.runner.start()
    }

    pub async fn shutdown(&mut self) {
        self.runner.stop().await;
    }

    pub fn runner(&self) -> &SimulationRunner {
        &self.runner
    }

    pub fn countdown(&self) -> &CountdownTimer {
        &self.countdown
    }

    pub fn stages(&self) -> &StageTracker {
        &self.stages
    }

    /// Apply one command and return the lines to show the player.
    pub fn handle(&mut self, command: Command) -> Result<(Flow, Vec<String>), RuntimeError> {
        let now = self.now_ms()?;
        let mut out = Vec::new();

        match command {
            Command::Dismiss(n) => {
                let dismissal = self.runner.dismiss(OccurrenceId::new(n))?;
                out.push(format!("closed: {}", dismissal.message.text));
                if dismissal.fine_acknowledged {
                    out.push("fine acknowledged".to_string());
                }
            }
            Command::NextStage | Command::PreviousStage => {
                let moved = if command == Command::NextStage {
                    self.stages.advance()
                } else {
                    self.stages.retreat()
                };
                match moved {
                    Some((from, to)) => {
                        info!(from = from.number(), to = to.number(), "Stage changed");
                        self.bus.publish(CourtEvent::StageChanged {
                            from: from.number(),
                            to: to.number(),
                            at_ms: now,
                        });
                        out.push(to.to_string());
                    }
                    None => out.push(format!("already at {}", self.stages.current())),
                }
            }
            Command::ToggleCountdown => {
                match self.countdown.phase() {
                    CountdownPhase::Setup => {
                        if !self.countdown.start(now) {
                            out.push("timer is set to 00:00".to_string());
                        }
                    }
                    CountdownPhase::Running => self.countdown.pause(now),
                    CountdownPhase::Paused => self.countdown.resume(now),
                    CountdownPhase::Expired => out.push("time is up; r to reset".to_string()),
                }
                out.push(format!("timer {}", self.countdown.display(now)));
            }
            Command::ResetCountdown => {
                self.countdown.stop_and_reset();
                out.push(format!("timer {}", self.countdown.display(now)));
            }
            Command::Status => out.extend(self.status_lines()?),
            Command::Help => out.push(HELP.to_string()),
            Command::Quit => return Ok((Flow::Quit, out)),
        }

        Ok((Flow::Continue, out))
    }

    /// Check the countdown; publishes an event the moment it runs out.
    pub fn poll_countdown(&mut self) -> Result<bool, RuntimeError> {
        let now = self.now_ms()?;
        let expired = self.countdown.poll(now);
        if expired {
            info!("Countdown expired");
            self.bus.publish(CourtEvent::CountdownExpired { at_ms: now });
        }
        Ok(expired)
    }

    pub fn status_lines(&self) -> Result<Vec<String>, RuntimeError> {
        let now = self.now_ms()?;
        let messages = self.runner.snapshot()?;
        let mut lines = vec![format!(
            "{} | timer {} | {} active message(s)",
            self.stages.current(),
            self.countdown.display(now),
            messages.len()
        )];
        lines.extend(messages.iter().map(|m| format!("  {}", AlertView::from(m))));
        Ok(lines)
    }

    fn now_ms(&self) -> Result<u64, RuntimeError> {
        Ok(self.runner.lock()?.now_ms())
    }
}
