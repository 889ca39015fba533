#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Autopilot system that steers the player through the mission objectives.
//!
//! The planner walks the objectives in mission order: gather keys until the
//! locks can be opened, grab the blueprint, then head for the exit. Routes are
//! computed with [`neon_heist_world::find_path`] over a copy of the maze where
//! cells the player cannot use yet are treated as walls, and cached until the
//! target changes or the player drifts off the planned route.

use std::{collections::VecDeque, time::Duration};

use neon_heist_core::{CellCoord, Command, Event, GuardView, IntervalTimer, ObjectiveSnapshot};
use neon_heist_world::{find_path, Grid};
use tracing::debug;

/// Configuration parameters required to construct the infiltration system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    step_interval: Duration,
}

impl Config {
    /// Creates a configuration that proposes at most one step per `step_interval`.
    #[must_use]
    pub const fn new(step_interval: Duration) -> Self {
        Self { step_interval }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

/// Pure system that emits player movement commands toward the next objective.
#[derive(Debug)]
pub struct Infiltration {
    timer: IntervalTimer,
    target: Option<CellCoord>,
    route: VecDeque<CellCoord>,
}

impl Infiltration {
    /// Creates a new infiltration system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            timer: IntervalTimer::new(config.step_interval),
            target: None,
            route: VecDeque::new(),
        }
    }

    /// Objective the autopilot is currently steering toward.
    #[must_use]
    pub fn target(&self) -> Option<CellCoord> {
        self.target
    }

    /// Consumes world events and immutable views to emit at most one player move.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &Grid,
        objectives: &ObjectiveSnapshot,
        guards: &GuardView,
        out: &mut Vec<Command>,
    ) {
        let mut ready = false;
        for event in events {
            match event {
                Event::MissionStarted { .. } => {
                    self.timer.start();
                    self.reset();
                    ready = false;
                }
                Event::MissionEnded { .. } => {
                    self.timer.cancel();
                    self.reset();
                    ready = false;
                }
                Event::TimeAdvanced { dt } => {
                    ready |= self.timer.advance(*dt) > 0;
                }
                _ => {}
            }
        }

        if !ready {
            return;
        }

        let player = objectives.player;
        while self.route.front() == Some(&player) {
            let _ = self.route.pop_front();
        }

        let passable = passable_grid(grid, objectives);
        let Some((target, path)) = select_objective(&passable, objectives) else {
            debug!(?player, "no reachable objective");
            self.reset();
            return;
        };

        let drifted = self
            .route
            .front()
            .map_or(true, |next| !next.is_adjacent(player));
        if self.target != Some(target) || drifted {
            debug!(?target, steps = path.len().saturating_sub(1), "route planned");
            self.target = Some(target);
            self.route = path.into_iter().skip(1).collect();
        }

        let Some(&next) = self.route.front() else {
            return;
        };

        if guards.occupies(next) {
            debug!(?next, "waiting for guard to clear");
            return;
        }

        match player.direction_to(next) {
            Some(direction) => out.push(Command::MovePlayer { direction }),
            None => self.route.clear(),
        }
    }

    fn reset(&mut self) {
        self.target = None;
        self.route.clear();
    }
}

impl Default for Infiltration {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Copy of the maze where locks stay shut until enough keys are held and the
/// exit stays shut until the blueprint is held.
fn passable_grid(grid: &Grid, objectives: &ObjectiveSnapshot) -> Grid {
    let locks = objectives
        .locks
        .iter()
        .copied()
        .filter(|_| !objectives.has_required_keys());
    let exit = Some(objectives.exit).filter(|_| !objectives.holds_blueprint());
    grid.with_obstacles(locks.chain(exit))
}

/// Picks the next objective and a path to it.
///
/// While keys are missing the nearest reachable key wins, ties going to the
/// key listed first. Otherwise the blueprint, then the exit.
fn select_objective(
    grid: &Grid,
    objectives: &ObjectiveSnapshot,
) -> Option<(CellCoord, Vec<CellCoord>)> {
    let player = objectives.player;

    if !objectives.has_required_keys() {
        let nearest = objectives
            .remaining_keys
            .iter()
            .filter_map(|&key| {
                let path = find_path(grid, player, key).ok()?;
                (!path.is_empty()).then_some((key, path))
            })
            .min_by_key(|(_, path)| path.len());
        if nearest.is_some() {
            return nearest;
        }
    }

    let target = objectives.blueprint.unwrap_or(objectives.exit);
    let path = find_path(grid, player, target).ok()?;
    (!path.is_empty()).then_some((target, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn objectives(player: CellCoord) -> ObjectiveSnapshot {
        ObjectiveSnapshot {
            player,
            remaining_keys: vec![CellCoord::new(4, 0), CellCoord::new(0, 2)],
            keys_collected: 0,
            required_keys: 1,
            locks: vec![CellCoord::new(2, 1)],
            blueprint: Some(CellCoord::new(4, 2)),
            exit: CellCoord::new(0, 1),
        }
    }

    #[test]
    fn nearest_key_is_chosen_first() {
        let grid = Grid::new(5, 3, []).expect("grid");
        let snapshot = objectives(CellCoord::new(1, 1));

        let (target, path) = select_objective(&passable_grid(&grid, &snapshot), &snapshot)
            .expect("reachable key");

        assert_eq!(target, CellCoord::new(0, 2));
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn blueprint_follows_keys_and_exit_follows_blueprint() {
        let grid = Grid::new(5, 3, []).expect("grid");
        let mut snapshot = objectives(CellCoord::new(1, 1));
        snapshot.keys_collected = 1;

        let (target, _) = select_objective(&passable_grid(&grid, &snapshot), &snapshot)
            .expect("blueprint reachable");
        assert_eq!(target, CellCoord::new(4, 2));

        snapshot.blueprint = None;
        let (target, path) = select_objective(&passable_grid(&grid, &snapshot), &snapshot)
            .expect("exit reachable");
        assert_eq!(target, CellCoord::new(0, 1));
        assert_eq!(path, vec![CellCoord::new(1, 1), CellCoord::new(0, 1)]);
    }

    #[test]
    fn closed_locks_and_exit_are_planned_around() {
        let grid = Grid::new(5, 3, []).expect("grid");
        let snapshot = objectives(CellCoord::new(1, 1));
        let passable = passable_grid(&grid, &snapshot);

        assert!(!passable.is_walkable(CellCoord::new(2, 1)));
        assert!(!passable.is_walkable(CellCoord::new(0, 1)));
        assert!(grid.is_walkable(CellCoord::new(2, 1)));
    }

    #[test]
    fn emits_nothing_before_mission_starts() {
        let grid = Grid::new(5, 3, []).expect("grid");
        let mut infiltration = Infiltration::default();
        let mut commands = Vec::new();

        infiltration.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_secs(1),
            }],
            &grid,
            &objectives(CellCoord::new(1, 1)),
            &GuardView::default(),
            &mut commands,
        );

        assert!(commands.is_empty());
        assert_eq!(infiltration.target(), None);
    }
}
