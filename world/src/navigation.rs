//! A* path search over the static walkability grid.
//!
//! Movement is 4-directional with unit step cost and the Manhattan distance
//! heuristic, which is admissible and consistent for that movement model, so
//! returned paths always have the minimum number of steps. The open set is a
//! binary heap ordered by `f` and then by discovery sequence: among equal `f`
//! values the cell that entered the open set first is expanded first, and a
//! cell keeps its sequence when a cheaper route to it is found. Results are
//! therefore fully deterministic for a given grid and endpoints.

use std::{cmp::Ordering, collections::BinaryHeap};

use neon_heist_core::CellCoord;
use thiserror::Error;

use crate::grid::Grid;

/// Errors raised for malformed path queries.
///
/// An unreachable goal is not an error: [`find_path`] reports it with an
/// empty path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    /// An endpoint lies outside the grid.
    #[error("cell {cell:?} lies outside the grid")]
    OutOfBounds {
        /// Offending endpoint.
        cell: CellCoord,
    },
    /// An endpoint is not walkable.
    #[error("cell {cell:?} is not walkable")]
    Blocked {
        /// Offending endpoint.
        cell: CellCoord,
    },
    /// No walkable path connects two consecutive patrol waypoints.
    #[error("no path from {from:?} to {to:?}")]
    Unreachable {
        /// Waypoint the leg starts from.
        from: CellCoord,
        /// Waypoint the leg leads to.
        to: CellCoord,
    },
    /// A patrol route was requested without any waypoints.
    #[error("patrol route requires at least one waypoint")]
    EmptyRoute,
}

/// Computes a shortest walkable path from `start` to `end`.
///
/// The returned path includes both endpoints and every consecutive pair of
/// cells is 4-adjacent. An empty path means `end` cannot be reached.
///
/// # Errors
///
/// Returns [`PathError::OutOfBounds`] when an endpoint lies outside the grid
/// and [`PathError::Blocked`] when an endpoint is not walkable.
pub fn find_path(
    grid: &Grid,
    start: CellCoord,
    end: CellCoord,
) -> Result<Vec<CellCoord>, PathError> {
    for cell in [start, end] {
        if !grid.contains(cell) {
            return Err(PathError::OutOfBounds { cell });
        }
    }
    for cell in [start, end] {
        if !grid.is_walkable(cell) {
            return Err(PathError::Blocked { cell });
        }
    }

    if start == end {
        return Ok(vec![start]);
    }

    let mut arena = SearchArena::new(grid.cell_count());
    let mut open = BinaryHeap::new();

    if let Some(entry) = arena.discover(grid, start, 0, None, end) {
        open.push(entry);
    }

    while let Some(entry) = open.pop() {
        let Some(index) = grid.index(entry.cell) else {
            continue;
        };

        let current = arena.nodes[index];
        if current.state != NodeState::Open || current.f != entry.f {
            continue;
        }
        arena.nodes[index].state = NodeState::Closed;

        if entry.cell == end {
            return Ok(arena.reconstruct(grid, end));
        }

        let tentative_g = current.g + 1;
        for neighbor in grid.walkable_neighbors(entry.cell) {
            let parent = Some(entry.cell);
            if let Some(next) = arena.discover(grid, neighbor, tentative_g, parent, end) {
                open.push(next);
            }
        }
    }

    Ok(Vec::new())
}

/// Derives a cyclic patrol route visiting `waypoints` in order.
///
/// Consecutive waypoints, including the last and the first, are joined with
/// shortest paths. The closing cell is dropped so that advancing the route
/// index modulo its length walks the loop without pausing on the first
/// waypoint.
///
/// # Errors
///
/// Returns [`PathError::EmptyRoute`] for an empty waypoint list,
/// [`PathError::Unreachable`] when a leg has no path, and the errors of
/// [`find_path`] for malformed waypoints.
pub fn patrol_route(grid: &Grid, waypoints: &[CellCoord]) -> Result<Vec<CellCoord>, PathError> {
    let Some(&first) = waypoints.first() else {
        return Err(PathError::EmptyRoute);
    };

    let mut route = vec![first];
    let closing = waypoints.iter().cycle().skip(1);
    for (&from, &to) in waypoints.iter().zip(closing) {
        let leg = find_path(grid, from, to)?;
        if leg.is_empty() {
            return Err(PathError::Unreachable { from, to });
        }

        for cell in leg.into_iter().skip(1) {
            if route.last() != Some(&cell) {
                route.push(cell);
            }
        }
    }

    if route.len() > 1 && route.last() == Some(&first) {
        let _ = route.pop();
    }

    Ok(route)
}

/// Reports whether `route` forms a closed 4-adjacent loop.
///
/// A single cell is a valid stationary route; an empty route is not.
#[must_use]
pub fn is_cyclic_route(route: &[CellCoord]) -> bool {
    match route {
        [] => false,
        [_] => true,
        _ => route
            .iter()
            .zip(route.iter().cycle().skip(1))
            .all(|(from, to)| from.is_adjacent(*to)),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum NodeState {
    #[default]
    Unvisited,
    Open,
    Closed,
}

#[derive(Clone, Copy, Debug, Default)]
struct SearchNode {
    g: u32,
    h: u32,
    f: u32,
    parent: Option<CellCoord>,
    sequence: u32,
    state: NodeState,
}

/// Per-query node storage indexed by the grid's row-major cell offset.
#[derive(Debug)]
struct SearchArena {
    nodes: Vec<SearchNode>,
    next_sequence: u32,
}

impl SearchArena {
    fn new(cell_count: usize) -> Self {
        Self {
            nodes: vec![SearchNode::default(); cell_count],
            next_sequence: 0,
        }
    }

    /// Records a route of cost `g` to `cell`, returning the heap entry to push
    /// when it is new or cheaper than the known one.
    fn discover(
        &mut self,
        grid: &Grid,
        cell: CellCoord,
        g: u32,
        parent: Option<CellCoord>,
        goal: CellCoord,
    ) -> Option<OpenEntry> {
        let index = grid.index(cell)?;
        let node = &mut self.nodes[index];

        match node.state {
            NodeState::Closed => return None,
            NodeState::Open if g >= node.g => return None,
            NodeState::Open => {}
            NodeState::Unvisited => {
                node.h = cell.manhattan_distance(goal);
                node.sequence = self.next_sequence;
                node.state = NodeState::Open;
                self.next_sequence = self.next_sequence.saturating_add(1);
            }
        }

        node.g = g;
        node.f = g + node.h;
        node.parent = parent;

        Some(OpenEntry {
            f: node.f,
            sequence: node.sequence,
            cell,
        })
    }

    fn reconstruct(&self, grid: &Grid, goal: CellCoord) -> Vec<CellCoord> {
        let mut path = Vec::new();
        let mut cursor = Some(goal);

        while let Some(cell) = cursor {
            path.push(cell);
            cursor = grid
                .index(cell)
                .and_then(|index| self.nodes.get(index))
                .and_then(|node| node.parent);
        }

        path.reverse();
        path
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    sequence: u32,
    cell: CellCoord,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the maximum, so lower (f, sequence) must compare greater.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid_path(grid: &Grid, path: &[CellCoord]) {
        for cell in path {
            assert!(grid.is_walkable(*cell), "path crosses blocked cell {cell:?}");
        }
        for pair in path.windows(2) {
            assert!(
                pair[0].is_adjacent(pair[1]),
                "path jumps from {:?} to {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn open_grid_path_matches_manhattan_distance() {
        let grid = Grid::new(6, 5, []).expect("grid");
        let pairs = [
            (CellCoord::new(0, 0), CellCoord::new(5, 4)),
            (CellCoord::new(5, 0), CellCoord::new(0, 4)),
            (CellCoord::new(2, 3), CellCoord::new(2, 0)),
            (CellCoord::new(4, 1), CellCoord::new(1, 1)),
        ];

        for (start, end) in pairs {
            let path = find_path(&grid, start, end).expect("query");
            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&end));
            assert_eq!(path.len() as u32 - 1, start.manhattan_distance(end));
            assert_valid_path(&grid, &path);
        }
    }

    #[test]
    fn start_equal_to_end_yields_single_cell() {
        let grid = Grid::new(3, 3, []).expect("grid");
        let cell = CellCoord::new(1, 2);
        assert_eq!(find_path(&grid, cell, cell), Ok(vec![cell]));
    }

    #[test]
    fn ties_expand_in_discovery_order() {
        let grid = Grid::new(3, 3, []).expect("grid");
        let path = find_path(&grid, CellCoord::new(0, 0), CellCoord::new(2, 2)).expect("query");

        assert_eq!(
            path,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(1, 0),
                CellCoord::new(2, 0),
                CellCoord::new(2, 1),
                CellCoord::new(2, 2),
            ]
        );
    }

    #[test]
    fn wall_forces_detour_through_gap() {
        let walls = (0..4).map(|row| CellCoord::new(2, row));
        let grid = Grid::new(5, 5, walls).expect("grid");

        let path = find_path(&grid, CellCoord::new(0, 0), CellCoord::new(4, 0)).expect("query");

        assert_eq!(path.len() - 1, 12, "detour must pass through (2, 4)");
        assert!(path.contains(&CellCoord::new(2, 4)));
        assert_valid_path(&grid, &path);
    }

    #[test]
    fn enclosed_goal_yields_empty_path() {
        let walls = [CellCoord::new(3, 4), CellCoord::new(4, 3)];
        let grid = Grid::new(5, 5, walls).expect("grid");

        let path = find_path(&grid, CellCoord::new(0, 0), CellCoord::new(4, 4)).expect("query");

        assert!(path.is_empty());
    }

    #[test]
    fn malformed_endpoints_are_rejected() {
        let wall = CellCoord::new(1, 1);
        let grid = Grid::new(3, 3, [wall]).expect("grid");
        let outside = CellCoord::new(3, 0);

        assert_eq!(
            find_path(&grid, outside, CellCoord::new(0, 0)),
            Err(PathError::OutOfBounds { cell: outside })
        );
        assert_eq!(
            find_path(&grid, CellCoord::new(0, 0), outside),
            Err(PathError::OutOfBounds { cell: outside })
        );
        assert_eq!(
            find_path(&grid, wall, CellCoord::new(0, 0)),
            Err(PathError::Blocked { cell: wall })
        );
        assert_eq!(
            find_path(&grid, CellCoord::new(0, 0), wall),
            Err(PathError::Blocked { cell: wall })
        );
    }

    #[test]
    fn open_entries_pop_lowest_f_then_earliest_sequence() {
        let mut heap = BinaryHeap::new();
        let cell = CellCoord::new(0, 0);
        heap.push(OpenEntry { f: 5, sequence: 0, cell });
        heap.push(OpenEntry { f: 4, sequence: 7, cell });
        heap.push(OpenEntry { f: 4, sequence: 3, cell });

        let order: Vec<_> = std::iter::from_fn(|| heap.pop())
            .map(|entry| (entry.f, entry.sequence))
            .collect();
        assert_eq!(order, vec![(4, 3), (4, 7), (5, 0)]);
    }

    #[test]
    fn patrol_route_closes_loop_without_repeating_origin() {
        let grid = Grid::new(4, 5, []).expect("grid");
        let waypoints = [CellCoord::new(1, 1), CellCoord::new(1, 3)];
        let route = patrol_route(&grid, &waypoints).expect("route");

        assert_eq!(
            route,
            vec![
                CellCoord::new(1, 1),
                CellCoord::new(1, 2),
                CellCoord::new(1, 3),
                CellCoord::new(1, 2),
            ]
        );
        assert!(is_cyclic_route(&route));
    }

    #[test]
    fn patrol_route_reports_unreachable_leg() {
        let walls = (0..3).map(|row| CellCoord::new(1, row));
        let grid = Grid::new(3, 3, walls).expect("grid");
        let from = CellCoord::new(0, 0);
        let to = CellCoord::new(2, 0);

        assert_eq!(
            patrol_route(&grid, &[from, to]),
            Err(PathError::Unreachable { from, to })
        );
        assert_eq!(patrol_route(&grid, &[]), Err(PathError::EmptyRoute));
    }

    #[test]
    fn single_waypoint_is_stationary_route() {
        let grid = Grid::new(2, 2, []).expect("grid");
        let post = CellCoord::new(1, 1);
        assert_eq!(patrol_route(&grid, &[post]), Ok(vec![post]));
    }

    #[test]
    fn cyclic_route_requires_adjacent_wrap() {
        let open_line = [
            CellCoord::new(0, 0),
            CellCoord::new(1, 0),
            CellCoord::new(2, 0),
        ];
        assert!(!is_cyclic_route(&open_line));
        assert!(!is_cyclic_route(&[]));
        assert!(is_cyclic_route(&[CellCoord::new(4, 4)]));
    }
}
