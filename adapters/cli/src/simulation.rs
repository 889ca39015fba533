//! Headless mission loop pumping world events through the systems.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use neon_heist_core::{Command, Event, MissionReport, MissionSetup};
use neon_heist_system_countdown::Countdown;
use neon_heist_system_infiltration::Infiltration;
use neon_heist_system_patrol::Patrol;
use neon_heist_world::{self as world, query, World};
use tracing::{info, warn};

/// Simulated time advanced per frame.
pub(crate) const FRAME: Duration = Duration::from_millis(250);

/// World plus the systems reacting to it.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    countdown: Countdown,
    patrol: Patrol,
    infiltration: Infiltration,
    elapsed: Duration,
}

impl Simulation {
    pub(crate) fn new() -> Self {
        Self {
            world: World::new(),
            countdown: Countdown::default(),
            patrol: Patrol::default(),
            infiltration: Infiltration::default(),
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn welcome_banner(&self) -> &'static str {
        query::welcome_banner(&self.world)
    }

    /// Applies `command` and feeds the resulting events to every system until
    /// no system has anything left to say. Returns every event emitted.
    pub(crate) fn dispatch(&mut self, command: Command) -> Vec<Event> {
        let mut log = Vec::new();
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        while !events.is_empty() {
            let mut commands = Vec::new();
            self.countdown.handle(&events, &mut commands);
            let guards = query::guard_view(&self.world);
            self.patrol.handle(&events, &guards, &mut commands);
            if let (Some(grid), Some(objectives)) =
                (query::grid(&self.world), query::objectives(&self.world))
            {
                self.infiltration
                    .handle(&events, grid, &objectives, &guards, &mut commands);
            }

            log.append(&mut events);
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }

        log
    }

    /// Configures and plays a mission until it ends or `max_time` elapses.
    pub(crate) fn run(&mut self, setup: MissionSetup, max_time: Duration) -> Result<MissionReport> {
        let configured = self.dispatch(Command::ConfigureMission { setup });
        if let Some(reason) = configured.iter().find_map(|event| match event {
            Event::MissionRejected { reason } => Some(*reason),
            _ => None,
        }) {
            bail!("mission setup rejected: {reason:?}");
        }

        let _ = self.dispatch(Command::StartMission);
        while !query::phase(&self.world).is_terminal() && self.elapsed < max_time {
            let _ = self.dispatch(Command::Tick { dt: FRAME });
            self.elapsed = self.elapsed.saturating_add(FRAME);
        }

        if !query::phase(&self.world).is_terminal() {
            warn!(elapsed = ?self.elapsed, "time cap reached, aborting mission");
            let _ = self.dispatch(Command::AbortMission);
        }

        let report = query::report(&self.world).context("mission did not reach a terminal phase")?;
        info!(
            success = report.outcome.is_success(),
            outcome = ?report.outcome,
            elapsed = ?self.elapsed,
            "mission finished"
        );
        Ok(report)
    }
}
