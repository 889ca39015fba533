#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Neon Heist engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative mission world, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Neon Heist.";

/// Number of keys a mission requires before its locks open, unless configured.
pub const DEFAULT_REQUIRED_KEYS: u32 = 2;

/// Upper bound of the security meter; reaching it triggers a lockdown.
pub const MAX_SECURITY_LEVEL: u8 = 100;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Replaces the current mission with one built from the provided setup.
    ///
    /// An active mission is aborted before the new one is configured.
    ConfigureMission {
        /// Static description of the maze and its inhabitants.
        setup: MissionSetup,
    },
    /// Transitions a configured, idle mission into the active phase.
    StartMission,
    /// Explicitly abandons the active mission and discards guard state.
    AbortMission,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Advances every guard a single step along its patrol route.
    AdvanceGuards,
    /// Consumes one second from the mission countdown.
    ElapseCountdown,
    /// Requests that the player move a single cell in the given direction.
    MovePlayer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Raises the security meter, typically after a failed puzzle attempt.
    RaiseSecurity {
        /// Amount added to the meter before saturation.
        amount: u8,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a mission was configured and is waiting to start.
    MissionConfigured {
        /// Number of grid columns.
        width: u32,
        /// Number of grid rows.
        height: u32,
        /// Number of guards patrolling the maze.
        guards: usize,
    },
    /// Reports that a mission setup or start request was rejected.
    MissionRejected {
        /// Specific reason the request failed.
        reason: SetupError,
    },
    /// Announces that the mission entered the active phase.
    MissionStarted {
        /// Countdown available to the player, in whole seconds.
        time_limit_secs: u32,
    },
    /// Announces that the mission reached a terminal phase.
    ///
    /// Emitted exactly once per mission; scheduled activities must stop.
    MissionEnded {
        /// Final result of the mission.
        outcome: MissionOutcome,
    },
    /// Reports the remaining countdown after a second elapsed.
    CountdownElapsed {
        /// Whole seconds left before the mission expires.
        remaining_secs: u32,
    },
    /// Confirms that a guard moved along its patrol route.
    GuardAdvanced {
        /// Identifier of the guard that advanced.
        guard_id: GuardId,
        /// Cell the guard occupied before moving.
        from: CellCoord,
        /// Cell the guard occupies after moving.
        to: CellCoord,
    },
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell the player occupied before moving.
        from: CellCoord,
        /// Cell the player occupies after moving.
        to: CellCoord,
    },
    /// Reports that a player move was refused while the mission stays active.
    PlayerMoveRejected {
        /// Direction of the refused step.
        direction: Direction,
        /// Specific reason the move failed.
        reason: MoveRejection,
    },
    /// Confirms that the player picked up a key.
    KeyCollected {
        /// Cell the key was collected from.
        cell: CellCoord,
        /// Total keys held after the pickup.
        collected: u32,
    },
    /// Confirms that the player opened a lock using collected keys.
    LockOpened {
        /// Cell of the lock that was opened.
        cell: CellCoord,
    },
    /// Confirms that the player picked up the blueprint.
    BlueprintAcquired {
        /// Cell the blueprint was collected from.
        cell: CellCoord,
    },
    /// Reports the new security level after it was raised.
    SecurityRaised {
        /// Level of the security meter after saturation.
        level: u8,
    },
}

/// Static description of a mission used to configure the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissionSetup {
    /// Number of grid columns.
    pub width: u32,
    /// Number of grid rows.
    pub height: u32,
    /// Cells that are not walkable. Out-of-bounds entries are ignored.
    pub walls: Vec<CellCoord>,
    /// Cell the player starts on.
    pub player: CellCoord,
    /// Cell holding the blueprint the player must extract.
    pub blueprint: CellCoord,
    /// Cell the player must reach while holding the blueprint.
    pub exit: CellCoord,
    /// Cells holding collectable keys.
    pub keys: Vec<CellCoord>,
    /// Cells blocked by locks until enough keys are held.
    pub locks: Vec<CellCoord>,
    /// Keys required to open a lock.
    pub required_keys: u32,
    /// Countdown available to the player, in whole seconds.
    pub time_limit_secs: u32,
    /// Cyclic patrol route for each guard; guards start on the first cell.
    pub guard_routes: Vec<Vec<CellCoord>>,
}

/// Lifecycle phase of the mission owned by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MissionPhase {
    /// Configured (or empty) and waiting to start.
    Idle,
    /// Timers run, guards patrol, and the player may move.
    Active,
    /// The player escaped with the blueprint.
    Succeeded,
    /// The mission failed for the provided reason.
    Failed(FailureReason),
}

impl MissionPhase {
    /// Reports whether the phase is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }

    /// Outcome associated with a terminal phase.
    #[must_use]
    pub const fn outcome(self) -> Option<MissionOutcome> {
        match self {
            Self::Succeeded => Some(MissionOutcome::Succeeded),
            Self::Failed(reason) => Some(MissionOutcome::Failed { reason }),
            Self::Idle | Self::Active => None,
        }
    }
}

/// Final result of a mission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionOutcome {
    /// The player escaped with the blueprint.
    Succeeded,
    /// The mission failed.
    Failed {
        /// Specific reason the mission failed.
        reason: FailureReason,
    },
}

impl MissionOutcome {
    /// Reports whether the outcome counts as a success.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Reasons an active mission may fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The countdown reached zero.
    TimeExpired,
    /// A guard and the player shared a cell.
    Detected,
    /// The security meter reached its maximum.
    Lockdown,
    /// The player abandoned the mission.
    Aborted,
}

/// Reasons a player move may be rejected without ending the mission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRejection {
    /// The destination lies outside the grid.
    OutOfBounds,
    /// The destination is a wall.
    Wall,
    /// The destination is a lock and the player lacks keys.
    Locked {
        /// Keys still needed to open the lock.
        missing_keys: u32,
    },
    /// The destination is the exit and the player lacks the blueprint.
    BlueprintRequired,
}

/// Reasons a mission setup or start request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetupError {
    /// The grid has a zero or unrepresentable dimension.
    InvalidDimensions,
    /// A mission object or patrol cell lies outside the grid.
    OutOfBounds(CellCoord),
    /// A mission object or patrol cell lies on a wall.
    Blocked(CellCoord),
    /// A guard route is empty or not 4-adjacent around its cycle.
    InvalidRoute {
        /// Index of the offending guard route.
        guard: usize,
    },
    /// Two of the blueprint, exit, key and lock cells share a cell.
    Overlap(CellCoord),
    /// No mission has been configured.
    MissingMission,
}

/// Cardinal movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in expansion order: up, right, down, left.
    pub const ALL: [Direction; 4] = [Self::North, Self::East, Self::South, Self::West];
}

/// Unique identifier assigned to a guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuardId(u32);

impl GuardId {
    /// Creates a new guard identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Reports whether the two cells share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: CellCoord) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Cell one step away in the provided direction.
    ///
    /// Returns `None` when the step would leave the representable range; grid
    /// bounds are the caller's concern.
    #[must_use]
    pub fn neighbor(self, direction: Direction) -> Option<CellCoord> {
        match direction {
            Direction::North => self.row.checked_sub(1).map(|row| Self::new(self.column, row)),
            Direction::East => self
                .column
                .checked_add(1)
                .map(|column| Self::new(column, self.row)),
            Direction::South => self.row.checked_add(1).map(|row| Self::new(self.column, row)),
            Direction::West => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(column, self.row)),
        }
    }

    /// Direction of a single step from `self` to `to`, if the cells are adjacent.
    #[must_use]
    pub fn direction_to(self, to: CellCoord) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&direction| self.neighbor(direction) == Some(to))
    }
}

/// Scheduled activity that fires once per elapsed interval while running.
///
/// Timers are owned by the systems that drive them and are started and
/// cancelled explicitly, so no activity keeps firing into a finished mission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalTimer {
    interval: Duration,
    accumulator: Duration,
    running: bool,
}

impl IntervalTimer {
    /// Creates a stopped timer with the provided cadence.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
            running: false,
        }
    }

    /// Starts the timer from a clean accumulator.
    pub fn start(&mut self) {
        self.accumulator = Duration::ZERO;
        self.running = true;
    }

    /// Stops the timer and discards any partially accumulated interval.
    pub fn cancel(&mut self) {
        self.accumulator = Duration::ZERO;
        self.running = false;
    }

    /// Reports whether the timer is currently scheduled.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Cadence at which the timer fires.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Accumulates `dt` and returns how many intervals elapsed.
    ///
    /// A stopped timer or a zero interval never fires.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.running || self.interval.is_zero() {
            return 0;
        }

        let interval = self.interval.as_nanos();
        let accumulated = self.accumulator.as_nanos().saturating_add(dt.as_nanos());
        let remainder = u64::try_from(accumulated % interval).unwrap_or(u64::MAX);
        self.accumulator = Duration::from_nanos(remainder);
        u32::try_from(accumulated / interval).unwrap_or(u32::MAX)
    }
}

/// Immutable representation of a single guard's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardSnapshot {
    /// Unique identifier assigned to the guard.
    pub id: GuardId,
    /// Grid cell currently occupied by the guard.
    pub cell: CellCoord,
    /// Index of `cell` within the guard's patrol route.
    pub route_index: usize,
    /// Number of cells in the patrol route.
    pub route_len: usize,
}

/// Read-only snapshot describing all guards within the maze.
#[derive(Clone, Debug, Default)]
pub struct GuardView {
    snapshots: Vec<GuardSnapshot>,
}

impl GuardView {
    /// Creates a new guard view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<GuardSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured guard snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &GuardSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the cells currently occupied by guards.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.snapshots.iter().map(|snapshot| snapshot.cell)
    }

    /// Reports whether any guard stands on the provided cell.
    #[must_use]
    pub fn occupies(&self, cell: CellCoord) -> bool {
        self.cells().any(|guard| guard == cell)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<GuardSnapshot> {
        self.snapshots
    }
}

/// Read-only snapshot of the player's progress through the mission objectives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectiveSnapshot {
    /// Cell currently occupied by the player.
    pub player: CellCoord,
    /// Keys still lying in the maze.
    pub remaining_keys: Vec<CellCoord>,
    /// Keys the player holds.
    pub keys_collected: u32,
    /// Keys required to open a lock.
    pub required_keys: u32,
    /// Locks that have not been opened.
    pub locks: Vec<CellCoord>,
    /// Blueprint cell, or `None` once the player holds it.
    pub blueprint: Option<CellCoord>,
    /// Cell the player must reach with the blueprint.
    pub exit: CellCoord,
}

impl ObjectiveSnapshot {
    /// Reports whether the player holds enough keys to open locks.
    #[must_use]
    pub const fn has_required_keys(&self) -> bool {
        self.keys_collected >= self.required_keys
    }

    /// Reports whether the player holds the blueprint.
    #[must_use]
    pub const fn holds_blueprint(&self) -> bool {
        self.blueprint.is_none()
    }
}

/// Results screen data produced once a mission reaches a terminal phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionReport {
    /// Final result of the mission.
    pub outcome: MissionOutcome,
    /// Countdown the mission started with, in whole seconds.
    pub time_limit_secs: u32,
    /// Countdown left when the mission ended, in whole seconds.
    pub time_remaining_secs: u32,
    /// Share of the countdown left, as a whole percentage.
    pub score_percent: u32,
    /// Keys the player collected.
    pub keys_collected: u32,
    /// Security level when the mission ended.
    pub security_level: u8,
}

impl MissionReport {
    /// Builds a report, deriving the score from the remaining countdown.
    #[must_use]
    pub fn new(
        outcome: MissionOutcome,
        time_limit_secs: u32,
        time_remaining_secs: u32,
        keys_collected: u32,
        security_level: u8,
    ) -> Self {
        Self {
            outcome,
            time_limit_secs,
            time_remaining_secs,
            score_percent: score_percent(time_remaining_secs, time_limit_secs),
            keys_collected,
            security_level,
        }
    }
}

/// Share of `limit` represented by `remaining`, floored to a whole percentage.
///
/// A zero limit scores zero; the result never exceeds 100.
#[must_use]
pub fn score_percent(remaining: u32, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }

    let percent = u64::from(remaining.min(limit)) * 100 / u64::from(limit);
    u32::try_from(percent).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn neighbor_and_direction_agree() {
        let origin = CellCoord::new(3, 3);
        for direction in Direction::ALL {
            let next = origin.neighbor(direction).expect("interior neighbor");
            assert_eq!(origin.direction_to(next), Some(direction));
        }
        assert_eq!(origin.direction_to(origin), None);
        assert_eq!(origin.direction_to(CellCoord::new(4, 4)), None);
    }

    #[test]
    fn neighbor_refuses_underflow() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.neighbor(Direction::North), None);
        assert_eq!(corner.neighbor(Direction::West), None);
        assert_eq!(corner.neighbor(Direction::East), Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn interval_timer_fires_once_per_interval() {
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        assert_eq!(timer.advance(Duration::from_secs(5)), 0, "stopped timer fired");

        timer.start();
        assert_eq!(timer.advance(Duration::from_millis(600)), 0);
        assert_eq!(timer.advance(Duration::from_millis(600)), 1);
        assert_eq!(timer.advance(Duration::from_millis(2_800)), 3);

        timer.cancel();
        assert!(!timer.is_running());
        assert_eq!(timer.advance(Duration::from_secs(3)), 0);
    }

    #[test]
    fn interval_timer_restart_discards_partial_interval() {
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        timer.start();
        assert_eq!(timer.advance(Duration::from_millis(900)), 0);
        timer.start();
        assert_eq!(timer.advance(Duration::from_millis(900)), 0);
    }

    #[test]
    fn zero_interval_timer_never_fires() {
        let mut timer = IntervalTimer::new(Duration::ZERO);
        timer.start();
        assert_eq!(timer.advance(Duration::from_secs(10)), 0);
    }

    #[test]
    fn huge_tick_saturates_fire_count() {
        let mut timer = IntervalTimer::new(Duration::from_nanos(1));
        timer.start();
        assert_eq!(timer.advance(Duration::from_secs(5)), u32::MAX);
        assert_eq!(timer.advance(Duration::MAX), u32::MAX);
    }

    #[test]
    fn long_tick_keeps_remainder() {
        let mut timer = IntervalTimer::new(Duration::from_millis(300));
        timer.start();
        assert_eq!(timer.advance(Duration::from_secs(3_000)), 10_000);
        assert_eq!(timer.advance(Duration::from_millis(250)), 0);
        assert_eq!(timer.advance(Duration::from_millis(100)), 1);
        assert_eq!(timer.interval(), Duration::from_millis(300));
    }

    #[test]
    fn score_is_floored_share_of_remaining_time() {
        assert_eq!(score_percent(150, 300), 50);
        assert_eq!(score_percent(299, 300), 99);
        assert_eq!(score_percent(0, 300), 0);
        assert_eq!(score_percent(10, 0), 0);
        assert_eq!(score_percent(400, 300), 100);
    }

    #[test]
    fn phase_reports_terminal_outcomes() {
        assert!(!MissionPhase::Idle.is_terminal());
        assert!(!MissionPhase::Active.is_terminal());
        assert_eq!(
            MissionPhase::Failed(FailureReason::Detected).outcome(),
            Some(MissionOutcome::Failed {
                reason: FailureReason::Detected
            })
        );
        assert!(MissionPhase::Succeeded
            .outcome()
            .is_some_and(MissionOutcome::is_success));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn mission_report_round_trips_through_bincode() {
        let report = MissionReport::new(
            MissionOutcome::Failed {
                reason: FailureReason::TimeExpired,
            },
            300,
            0,
            1,
            40,
        );
        assert_round_trip(&report);
    }

    #[test]
    fn setup_error_round_trips_through_bincode() {
        assert_round_trip(&SetupError::Blocked(CellCoord::new(2, 9)));
    }
}
