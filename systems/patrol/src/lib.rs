#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Guard patrol system that steps every guard along its route on a fixed cadence.

use std::time::Duration;

use neon_heist_core::{Command, Event, GuardView, IntervalTimer};
use tracing::trace;

/// Configuration parameters required to construct the patrol system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    step_interval: Duration,
}

impl Config {
    /// Creates a configuration advancing guards once per `step_interval`.
    #[must_use]
    pub const fn new(step_interval: Duration) -> Self {
        Self { step_interval }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// Pure system that emits guard advancement commands during an active mission.
#[derive(Debug)]
pub struct Patrol {
    timer: IntervalTimer,
}

impl Patrol {
    /// Creates a new patrol system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            timer: IntervalTimer::new(config.step_interval),
        }
    }

    /// Reports whether the patrol timer is currently scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Consumes world events and the guard view to emit advancement commands.
    pub fn handle(&mut self, events: &[Event], guards: &GuardView, out: &mut Vec<Command>) {
        let mut steps: u32 = 0;

        for event in events {
            match event {
                Event::MissionStarted { .. } => {
                    trace!(interval = ?self.timer.interval(), "patrol timer started");
                    self.timer.start();
                    steps = 0;
                }
                Event::MissionEnded { .. } => {
                    if self.timer.is_running() {
                        trace!("patrol timer cancelled");
                    }
                    self.timer.cancel();
                    steps = 0;
                }
                Event::TimeAdvanced { dt } => {
                    steps = steps.saturating_add(self.timer.advance(*dt));
                }
                _ => {}
            }
        }

        if guards.iter().next().is_none() {
            return;
        }

        for _ in 0..steps {
            out.push(Command::AdvanceGuards);
        }
    }
}

impl Default for Patrol {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
