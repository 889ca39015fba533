#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative mission state management for Neon Heist.
//!
//! The world owns the maze grid, the player, the patrolling guards, and the
//! mission lifecycle. Every mutation arrives as a [`Command`] through
//! [`apply`], and every observable change leaves as an [`Event`]. Mission
//! termination is a one-way latch: only an active mission can end, so
//! duplicate failure signals within a tick collapse into a single
//! [`Event::MissionEnded`].

pub mod detection;
pub mod grid;
pub mod navigation;

use std::collections::BTreeSet;

use neon_heist_core::{
    CellCoord, Command, Direction, Event, FailureReason, GuardId, MissionPhase, MissionSetup,
    MoveRejection, SetupError, MAX_SECURITY_LEVEL, WELCOME_BANNER,
};
use tracing::{debug, info, warn};

pub use grid::{Grid, GridError};
pub use navigation::{find_path, patrol_route, PathError};

/// Represents the authoritative Neon Heist world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    phase: MissionPhase,
    mission: Option<Mission>,
    tick_index: u64,
}

impl World {
    /// Creates an empty world waiting for a mission configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            phase: MissionPhase::Idle,
            mission: None,
            tick_index: 0,
        }
    }

    fn configure(&mut self, setup: MissionSetup, out_events: &mut Vec<Event>) {
        if self.phase == MissionPhase::Active {
            self.end(MissionPhase::Failed(FailureReason::Aborted), out_events);
        }
        self.phase = MissionPhase::Idle;

        match Mission::from_setup(setup) {
            Ok(mission) => {
                let width = mission.grid.width();
                let height = mission.grid.height();
                let guards = mission.guards.len();
                let walkable = mission.grid.walkable_cell_count();
                info!(width, height, guards, walkable, "mission configured");
                self.mission = Some(mission);
                out_events.push(Event::MissionConfigured {
                    width,
                    height,
                    guards,
                });
            }
            Err(reason) => {
                warn!(?reason, "mission setup rejected");
                self.mission = None;
                out_events.push(Event::MissionRejected { reason });
            }
        }
    }

    fn start(&mut self, out_events: &mut Vec<Event>) {
        let Some(mission) = self.mission.as_mut() else {
            out_events.push(Event::MissionRejected {
                reason: SetupError::MissingMission,
            });
            return;
        };

        if self.phase != MissionPhase::Idle {
            debug!(phase = ?self.phase, "start ignored outside idle phase");
            return;
        }

        mission.time_remaining_secs = mission.time_limit_secs;
        let time_limit_secs = mission.time_limit_secs;
        let spotted = detection::check_collision(mission.player, mission.guard_cells());

        self.phase = MissionPhase::Active;
        info!(time_limit_secs, "mission started");
        out_events.push(Event::MissionStarted { time_limit_secs });

        if time_limit_secs == 0 {
            self.end(MissionPhase::Failed(FailureReason::TimeExpired), out_events);
        } else if spotted {
            self.end(MissionPhase::Failed(FailureReason::Detected), out_events);
        }
    }

    fn abort(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != MissionPhase::Active {
            debug!(phase = ?self.phase, "abort ignored outside active phase");
            return;
        }

        if let Some(mission) = self.mission.as_mut() {
            mission.guards.clear();
        }
        self.end(MissionPhase::Failed(FailureReason::Aborted), out_events);
    }

    fn advance_guards(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != MissionPhase::Active {
            return;
        }
        let Some(mission) = self.mission.as_mut() else {
            return;
        };

        for guard in &mut mission.guards {
            let from = guard.cell;
            let to = guard.advance();
            out_events.push(Event::GuardAdvanced {
                guard_id: guard.id,
                from,
                to,
            });
        }

        let player = mission.player;
        let spotted_by: Vec<GuardId> = mission
            .guards
            .iter()
            .filter(|guard| guard.cell == player)
            .map(|guard| guard.id)
            .collect();

        for guard_id in spotted_by {
            debug!(guard = guard_id.get(), "guard walked into the player");
            self.end(MissionPhase::Failed(FailureReason::Detected), out_events);
        }
    }

    fn elapse_countdown(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != MissionPhase::Active {
            return;
        }
        let Some(mission) = self.mission.as_mut() else {
            return;
        };

        mission.time_remaining_secs = mission.time_remaining_secs.saturating_sub(1);
        let remaining_secs = mission.time_remaining_secs;
        out_events.push(Event::CountdownElapsed { remaining_secs });

        if remaining_secs == 0 {
            self.end(MissionPhase::Failed(FailureReason::TimeExpired), out_events);
        }
    }

    fn move_player(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.phase != MissionPhase::Active {
            debug!(?direction, "move ignored outside active phase");
            return;
        }
        let Some(mission) = self.mission.as_mut() else {
            return;
        };

        match mission.step_player(direction, out_events) {
            StepOutcome::Rejected(reason) => {
                debug!(?direction, ?reason, "player move rejected");
                out_events.push(Event::PlayerMoveRejected { direction, reason });
            }
            StepOutcome::Detected => {
                debug!(?direction, "player walked into a guard");
                self.end(MissionPhase::Failed(FailureReason::Detected), out_events);
            }
            StepOutcome::Moved => {}
            StepOutcome::Escaped => self.end(MissionPhase::Succeeded, out_events),
        }
    }

    fn raise_security(&mut self, amount: u8, out_events: &mut Vec<Event>) {
        if self.phase != MissionPhase::Active {
            return;
        }
        let Some(mission) = self.mission.as_mut() else {
            return;
        };

        mission.security_level = mission
            .security_level
            .saturating_add(amount)
            .min(MAX_SECURITY_LEVEL);
        let level = mission.security_level;
        out_events.push(Event::SecurityRaised { level });

        if level >= MAX_SECURITY_LEVEL {
            self.end(MissionPhase::Failed(FailureReason::Lockdown), out_events);
        }
    }

    /// Moves an active mission into the provided terminal phase exactly once.
    fn end(&mut self, phase: MissionPhase, out_events: &mut Vec<Event>) {
        if self.phase != MissionPhase::Active {
            return;
        }
        let Some(outcome) = phase.outcome() else {
            return;
        };

        self.phase = phase;
        info!(?outcome, "mission ended");
        out_events.push(Event::MissionEnded { outcome });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureMission { setup } => world.configure(setup, out_events),
        Command::StartMission => world.start(out_events),
        Command::AbortMission => world.abort(out_events),
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::AdvanceGuards => world.advance_guards(out_events),
        Command::ElapseCountdown => world.elapse_countdown(out_events),
        Command::MovePlayer { direction } => world.move_player(direction, out_events),
        Command::RaiseSecurity { amount } => world.raise_security(amount, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use neon_heist_core::{
        CellCoord, GuardSnapshot, GuardView, MissionPhase, MissionReport, ObjectiveSnapshot,
    };

    use super::{Grid, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Current lifecycle phase of the mission.
    #[must_use]
    pub fn phase(world: &World) -> MissionPhase {
        world.phase
    }

    /// Number of ticks applied since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Provides read-only access to the configured maze grid.
    #[must_use]
    pub fn grid(world: &World) -> Option<&Grid> {
        world.mission.as_ref().map(|mission| &mission.grid)
    }

    /// Cell currently occupied by the player.
    #[must_use]
    pub fn player_cell(world: &World) -> Option<CellCoord> {
        world.mission.as_ref().map(|mission| mission.player)
    }

    /// Captures a read-only view of the guards patrolling the maze.
    #[must_use]
    pub fn guard_view(world: &World) -> GuardView {
        let snapshots = world
            .mission
            .iter()
            .flat_map(|mission| mission.guards.iter())
            .map(|guard| GuardSnapshot {
                id: guard.id,
                cell: guard.cell,
                route_index: guard.route_index,
                route_len: guard.route.len(),
            })
            .collect();
        GuardView::from_snapshots(snapshots)
    }

    /// Captures the player's progress through the mission objectives.
    #[must_use]
    pub fn objectives(world: &World) -> Option<ObjectiveSnapshot> {
        world.mission.as_ref().map(|mission| ObjectiveSnapshot {
            player: mission.player,
            remaining_keys: mission.keys.clone(),
            keys_collected: mission.keys_collected,
            required_keys: mission.required_keys,
            locks: mission.locks.clone(),
            blueprint: mission.blueprint,
            exit: mission.exit,
        })
    }

    /// Whole seconds left on the mission countdown.
    #[must_use]
    pub fn time_remaining_secs(world: &World) -> Option<u32> {
        world
            .mission
            .as_ref()
            .map(|mission| mission.time_remaining_secs)
    }

    /// Current level of the security meter.
    #[must_use]
    pub fn security_level(world: &World) -> Option<u8> {
        world.mission.as_ref().map(|mission| mission.security_level)
    }

    /// Results screen data, available once the mission reached a terminal phase.
    #[must_use]
    pub fn report(world: &World) -> Option<MissionReport> {
        let outcome = world.phase.outcome()?;
        let mission = world.mission.as_ref()?;
        Some(MissionReport::new(
            outcome,
            mission.time_limit_secs,
            mission.time_remaining_secs,
            mission.keys_collected,
            mission.security_level,
        ))
    }
}

#[derive(Debug)]
struct Mission {
    grid: Grid,
    player: CellCoord,
    guards: Vec<Guard>,
    keys: Vec<CellCoord>,
    locks: Vec<CellCoord>,
    required_keys: u32,
    keys_collected: u32,
    blueprint: Option<CellCoord>,
    exit: CellCoord,
    time_limit_secs: u32,
    time_remaining_secs: u32,
    security_level: u8,
}

impl Mission {
    fn from_setup(setup: MissionSetup) -> Result<Self, SetupError> {
        let grid = Grid::new(setup.width, setup.height, setup.walls.iter().copied())
            .map_err(|_| SetupError::InvalidDimensions)?;

        let objects = [setup.player, setup.blueprint, setup.exit]
            .into_iter()
            .chain(setup.keys.iter().copied())
            .chain(setup.locks.iter().copied());
        for cell in objects {
            ensure_walkable(&grid, cell)?;
        }

        let mut occupied = BTreeSet::new();
        let objectives = [setup.blueprint, setup.exit]
            .into_iter()
            .chain(setup.keys.iter().copied())
            .chain(setup.locks.iter().copied());
        for cell in objectives {
            if !occupied.insert(cell) {
                return Err(SetupError::Overlap(cell));
            }
        }

        let mut guards = Vec::with_capacity(setup.guard_routes.len());
        for (index, route) in setup.guard_routes.into_iter().enumerate() {
            for &cell in &route {
                ensure_walkable(&grid, cell)?;
            }
            if !navigation::is_cyclic_route(&route) {
                return Err(SetupError::InvalidRoute { guard: index });
            }

            let id = GuardId::new(u32::try_from(index).unwrap_or(u32::MAX));
            let guard = Guard::new(id, route).ok_or(SetupError::InvalidRoute { guard: index })?;
            guards.push(guard);
        }

        Ok(Self {
            grid,
            player: setup.player,
            guards,
            keys: setup.keys,
            locks: setup.locks,
            required_keys: setup.required_keys,
            keys_collected: 0,
            blueprint: Some(setup.blueprint),
            exit: setup.exit,
            time_limit_secs: setup.time_limit_secs,
            time_remaining_secs: setup.time_limit_secs,
            security_level: 0,
        })
    }

    fn guard_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.guards.iter().map(|guard| guard.cell)
    }

    fn step_player(&mut self, direction: Direction, out_events: &mut Vec<Event>) -> StepOutcome {
        let from = self.player;
        let Some(target) = from
            .neighbor(direction)
            .filter(|cell| self.grid.contains(*cell))
        else {
            return StepOutcome::Rejected(MoveRejection::OutOfBounds);
        };

        if !self.grid.is_walkable(target) {
            return StepOutcome::Rejected(MoveRejection::Wall);
        }

        if self.locks.contains(&target) && self.keys_collected < self.required_keys {
            return StepOutcome::Rejected(MoveRejection::Locked {
                missing_keys: self.required_keys - self.keys_collected,
            });
        }

        if detection::check_collision(target, self.guard_cells()) {
            return StepOutcome::Detected;
        }

        if target == self.exit && self.blueprint.is_some() {
            return StepOutcome::Rejected(MoveRejection::BlueprintRequired);
        }

        self.player = target;
        out_events.push(Event::PlayerMoved { from, to: target });

        if let Some(position) = self.keys.iter().position(|key| *key == target) {
            let _ = self.keys.remove(position);
            self.keys_collected = self.keys_collected.saturating_add(1);
            out_events.push(Event::KeyCollected {
                cell: target,
                collected: self.keys_collected,
            });
        }

        if let Some(position) = self.locks.iter().position(|lock| *lock == target) {
            let _ = self.locks.remove(position);
            out_events.push(Event::LockOpened { cell: target });
        }

        if self.blueprint == Some(target) {
            self.blueprint = None;
            out_events.push(Event::BlueprintAcquired { cell: target });
        }

        if target == self.exit {
            StepOutcome::Escaped
        } else {
            StepOutcome::Moved
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StepOutcome {
    Rejected(MoveRejection),
    Detected,
    Moved,
    Escaped,
}

#[derive(Clone, Debug)]
struct Guard {
    id: GuardId,
    cell: CellCoord,
    route: Vec<CellCoord>,
    route_index: usize,
}

impl Guard {
    fn new(id: GuardId, route: Vec<CellCoord>) -> Option<Self> {
        let cell = route.first().copied()?;
        Some(Self {
            id,
            cell,
            route,
            route_index: 0,
        })
    }

    /// Steps to the next route entry, wrapping at the end of the loop.
    fn advance(&mut self) -> CellCoord {
        if self.route.is_empty() {
            return self.cell;
        }

        self.route_index = (self.route_index + 1) % self.route.len();
        self.cell = self.route[self.route_index];
        self.cell
    }
}

fn ensure_walkable(grid: &Grid, cell: CellCoord) -> Result<(), SetupError> {
    if !grid.contains(cell) {
        return Err(SetupError::OutOfBounds(cell));
    }
    if !grid.is_walkable(cell) {
        return Err(SetupError::Blocked(cell));
    }
    Ok(())
}
