//! Seeded wall scattering on top of an existing layout.

use neon_heist_core::CellCoord;
use neon_heist_world::{find_path, Grid};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::layout::{LayoutError, MazeLayout};

const WALL_DENSITY: f64 = 0.12;
const MAX_ATTEMPTS: u32 = 64;

/// Outcome of a scatter request.
#[derive(Debug)]
pub(crate) enum Scatter {
    /// A layout whose objectives all stay reachable from the player.
    Generated(MazeLayout),
    /// Every attempt cut off an objective.
    Exhausted,
}

/// Adds randomly placed walls to `base`, retrying until every objective stays
/// reachable from the player start. The same seed always yields the same maze.
pub(crate) fn scatter_walls(base: &MazeLayout, seed: u64) -> Result<Scatter, LayoutError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let reserved = base.reserved_cells();
    let existing = base.wall_cells();

    for attempt in 0..MAX_ATTEMPTS {
        let mut candidate = base.clone();
        for row in 0..base.height {
            for column in 0..base.width {
                let cell = CellCoord::new(column, row);
                if reserved.contains(&cell) || existing.contains(&cell) {
                    continue;
                }
                if rng.gen_bool(WALL_DENSITY) {
                    candidate.walls.push([column, row]);
                }
            }
        }

        if objectives_reachable(&candidate)? {
            debug!(seed, attempt, "generated maze");
            return Ok(Scatter::Generated(candidate));
        }
    }

    Ok(Scatter::Exhausted)
}

fn objectives_reachable(layout: &MazeLayout) -> Result<bool, LayoutError> {
    let setup = match layout.to_setup() {
        Ok(setup) => setup,
        Err(LayoutError::GuardRoute { .. }) => return Ok(false),
        Err(error) => return Err(error),
    };
    let grid = Grid::new(setup.width, setup.height, setup.walls.iter().copied())?;

    let targets = [setup.blueprint, setup.exit]
        .into_iter()
        .chain(setup.keys.iter().copied());
    for target in targets {
        match find_path(&grid, setup.player, target) {
            Ok(path) if !path.is_empty() => {}
            _ => return Ok(false),
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(seed: u64) -> MazeLayout {
        match scatter_walls(&MazeLayout::blueprint_extraction(), seed).expect("scatter") {
            Scatter::Generated(layout) => layout,
            Scatter::Exhausted => panic!("seed {seed} exhausted its attempts"),
        }
    }

    #[test]
    fn same_seed_yields_same_maze() {
        assert_eq!(generate(7), generate(7));
    }

    #[test]
    fn generated_maze_keeps_objectives_reachable() {
        let base = MazeLayout::blueprint_extraction();
        for seed in [1, 2, 3, 42] {
            let layout = generate(seed);
            assert!(layout.walls.len() > base.walls.len());
            assert!(objectives_reachable(&layout).expect("valid layout"));
        }
    }

    #[test]
    fn scattered_walls_avoid_reserved_cells() {
        let base = MazeLayout::blueprint_extraction();
        let layout = generate(11);
        let reserved = layout.reserved_cells();
        for &[column, row] in &layout.walls[base.walls.len()..] {
            assert!(!reserved.contains(&CellCoord::new(column, row)));
        }
    }
}
