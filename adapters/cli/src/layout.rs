//! Maze layouts loaded from TOML files or built in.

use std::{collections::BTreeSet, fs, path::Path};

use neon_heist_core::{CellCoord, MissionSetup, DEFAULT_REQUIRED_KEYS};
use neon_heist_world::{patrol_route, Grid, GridError, PathError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_TIME_LIMIT_SECS: u32 = 300;
const BLUEPRINT_GRID_SIZE: u32 = 15;

/// Errors raised while turning a layout into a mission setup.
#[derive(Debug, Error)]
pub(crate) enum LayoutError {
    /// The layout file could not be read.
    #[error("could not read layout file")]
    Io(#[from] std::io::Error),
    /// The layout file is not valid TOML for the layout schema.
    #[error("could not parse layout")]
    Parse(#[from] toml::de::Error),
    /// The layout dimensions are unusable.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// A guard lists both or neither of `route` and `waypoints`.
    #[error("guard {guard} must define exactly one of `route` or `waypoints`")]
    AmbiguousGuard {
        /// Position of the guard in the layout.
        guard: usize,
    },
    /// A guard's waypoints could not be joined into a patrol loop.
    #[error("guard {guard} has no valid patrol route")]
    GuardRoute {
        /// Position of the guard in the layout.
        guard: usize,
        /// Underlying path search failure.
        #[source]
        source: PathError,
    },
}

/// Cell written as `[column, row]`.
pub(crate) type Cell = [u32; 2];

/// Serializable description of a maze and its mission objectives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MazeLayout {
    /// Number of columns.
    pub(crate) width: u32,
    /// Number of rows.
    pub(crate) height: u32,
    /// Surrounds the maze with a wall ring when set.
    #[serde(default)]
    pub(crate) border: bool,
    /// Interior wall cells.
    #[serde(default)]
    pub(crate) walls: Vec<Cell>,
    /// Player start cell.
    pub(crate) player: Cell,
    /// Blueprint cell.
    pub(crate) blueprint: Cell,
    /// Exit cell.
    pub(crate) exit: Cell,
    /// Key cells.
    #[serde(default)]
    pub(crate) keys: Vec<Cell>,
    /// Lock cells.
    #[serde(default)]
    pub(crate) locks: Vec<Cell>,
    /// Keys needed to open locks; defaults to every key in the layout.
    #[serde(default)]
    pub(crate) required_keys: Option<u32>,
    /// Countdown in whole seconds.
    #[serde(default = "default_time_limit")]
    pub(crate) time_limit_secs: u32,
    /// Patrolling guards.
    #[serde(default)]
    pub(crate) guards: Vec<GuardLayout>,
}

/// Guard patrol, authored cell by cell or derived from waypoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GuardLayout {
    /// Closed loop of adjacent cells walked as written.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) route: Vec<Cell>,
    /// Cells joined with shortest paths into a closed loop.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) waypoints: Vec<Cell>,
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_SECS
}

fn cell([column, row]: Cell) -> CellCoord {
    CellCoord::new(column, row)
}

fn cells(list: &[Cell]) -> impl Iterator<Item = CellCoord> + '_ {
    list.iter().copied().map(cell)
}

impl MazeLayout {
    /// Reads and parses a TOML layout from disk.
    pub(crate) fn load(path: &Path) -> Result<Self, LayoutError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses a TOML layout.
    pub(crate) fn from_toml_str(contents: &str) -> Result<Self, LayoutError> {
        Ok(toml::from_str(contents)?)
    }

    /// The 15x15 blueprint extraction maze with three patrolling guards.
    pub(crate) fn blueprint_extraction() -> Self {
        let size = BLUEPRINT_GRID_SIZE;
        let walls = (1..size - 1)
            .flat_map(|row| (1..size - 1).map(move |column| [column, row]))
            .filter(|&[x, y]| (x % 3 == 0 && y % 2 == 0) || (x % 4 == 0 && y % 3 == 0))
            .collect();

        Self {
            width: size,
            height: size,
            border: true,
            walls,
            player: [1, 1],
            blueprint: [12, 12],
            exit: [13, 1],
            keys: vec![[3, 3], [7, 7]],
            locks: vec![[11, 1]],
            required_keys: Some(DEFAULT_REQUIRED_KEYS),
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            guards: vec![
                GuardLayout {
                    route: vec![[4, 4], [4, 5], [4, 6], [4, 7], [4, 6], [4, 5]],
                    waypoints: Vec::new(),
                },
                GuardLayout {
                    route: vec![[10, 10], [11, 10], [12, 10], [11, 10]],
                    waypoints: Vec::new(),
                },
                GuardLayout {
                    route: vec![[8, 2], [8, 3], [8, 4], [8, 3]],
                    waypoints: Vec::new(),
                },
            ],
        }
    }

    /// Cells that must stay walkable whatever the wall list says.
    pub(crate) fn reserved_cells(&self) -> BTreeSet<CellCoord> {
        let objects = [self.player, self.blueprint, self.exit].map(cell);
        let guards = self
            .guards
            .iter()
            .flat_map(|guard| cells(&guard.route).chain(cells(&guard.waypoints)));

        objects
            .into_iter()
            .chain(cells(&self.keys))
            .chain(cells(&self.locks))
            .chain(guards)
            .collect()
    }

    /// Wall cells after adding the border and carving out reserved cells.
    pub(crate) fn wall_cells(&self) -> Vec<CellCoord> {
        let reserved = self.reserved_cells();
        let border = self.border_cells();
        let walls: BTreeSet<CellCoord> = cells(&self.walls)
            .chain(border)
            .filter(|wall| !reserved.contains(wall))
            .collect();
        walls.into_iter().collect()
    }

    fn border_cells(&self) -> Vec<CellCoord> {
        if !self.border || self.width == 0 || self.height == 0 {
            return Vec::new();
        }

        let (right, bottom) = (self.width - 1, self.height - 1);
        let horizontal = (0..self.width)
            .flat_map(|column| [CellCoord::new(column, 0), CellCoord::new(column, bottom)]);
        let vertical = (0..self.height)
            .flat_map(|row| [CellCoord::new(0, row), CellCoord::new(right, row)]);
        horizontal.chain(vertical).collect()
    }

    /// Builds the mission setup, deriving waypoint patrols along shortest paths.
    pub(crate) fn to_setup(&self) -> Result<MissionSetup, LayoutError> {
        let walls = self.wall_cells();
        let grid = Grid::new(self.width, self.height, walls.iter().copied())?;

        let guard_routes = self
            .guards
            .iter()
            .enumerate()
            .map(|(index, guard)| guard.resolve(index, &grid))
            .collect::<Result<Vec<_>, _>>()?;

        let keys: Vec<CellCoord> = cells(&self.keys).collect();
        let required_keys = self
            .required_keys
            .unwrap_or_else(|| u32::try_from(keys.len()).unwrap_or(u32::MAX));

        Ok(MissionSetup {
            width: self.width,
            height: self.height,
            walls,
            player: cell(self.player),
            blueprint: cell(self.blueprint),
            exit: cell(self.exit),
            keys,
            locks: cells(&self.locks).collect(),
            required_keys,
            time_limit_secs: self.time_limit_secs,
            guard_routes,
        })
    }
}

impl GuardLayout {
    fn resolve(&self, index: usize, grid: &Grid) -> Result<Vec<CellCoord>, LayoutError> {
        match (self.route.is_empty(), self.waypoints.is_empty()) {
            (false, true) => Ok(cells(&self.route).collect()),
            (true, false) => {
                let waypoints: Vec<CellCoord> = cells(&self.waypoints).collect();
                patrol_route(grid, &waypoints).map_err(|source| LayoutError::GuardRoute {
                    guard: index,
                    source,
                })
            }
            _ => Err(LayoutError::AmbiguousGuard { guard: index }),
        }
    }
}
