#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Mission countdown system that converts elapsed time into whole-second ticks.

use std::time::Duration;

use neon_heist_core::{Command, Event, IntervalTimer};
use tracing::trace;

/// Configuration parameters required to construct the countdown system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    interval: Duration,
}

impl Config {
    /// Creates a configuration that elapses one countdown second per `interval`.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// Pure system that schedules countdown ticks while a mission is active.
#[derive(Debug)]
pub struct Countdown {
    timer: IntervalTimer,
}

impl Countdown {
    /// Creates a new countdown system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            timer: IntervalTimer::new(config.interval),
        }
    }

    /// Reports whether the countdown timer is currently scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Consumes world events and emits one countdown command per elapsed interval.
    ///
    /// Intervals that elapse before a [`Event::MissionEnded`] in the same batch
    /// are discarded together with the timer.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut pending: u32 = 0;

        for event in events {
            match event {
                Event::MissionStarted { .. } => {
                    trace!(interval = ?self.timer.interval(), "countdown timer started");
                    self.timer.start();
                    pending = 0;
                }
                Event::MissionEnded { .. } => {
                    if self.timer.is_running() {
                        trace!("countdown timer cancelled");
                    }
                    self.timer.cancel();
                    pending = 0;
                }
                Event::TimeAdvanced { dt } => {
                    pending = pending.saturating_add(self.timer.advance(*dt));
                }
                _ => {}
            }
        }

        for _ in 0..pending {
            out.push(Command::ElapseCountdown);
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
