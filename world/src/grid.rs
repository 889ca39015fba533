//! Static walkability grid built once per maze.

use neon_heist_core::CellCoord;
use thiserror::Error;

/// Errors raised while constructing a [`Grid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// Width or height is zero, or the cell count does not fit in memory.
    #[error("grid dimensions {width}x{height} are invalid")]
    InvalidDimensions {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
}

/// Dense walkability matrix stored in row-major order.
///
/// The grid owns no search state; path queries borrow it immutably and keep
/// their bookkeeping in per-query arenas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    walkable: Vec<bool>,
}

impl Grid {
    /// Builds a grid where every cell is walkable unless listed in `obstacles`.
    ///
    /// Obstacles outside the grid are ignored.
    pub fn new<I>(width: u32, height: u32, obstacles: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let invalid = GridError::InvalidDimensions { width, height };
        if width == 0 || height == 0 {
            return Err(invalid);
        }

        let columns = usize::try_from(width).map_err(|_| invalid)?;
        let rows = usize::try_from(height).map_err(|_| invalid)?;
        let cell_count = columns.checked_mul(rows).ok_or(invalid)?;

        let mut grid = Self {
            width,
            height,
            walkable: vec![true; cell_count],
        };
        grid.block(obstacles);
        Ok(grid)
    }

    /// Copy of the grid with additional cells marked as blocked.
    #[must_use]
    pub fn with_obstacles<I>(&self, obstacles: I) -> Self
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let mut grid = self.clone();
        grid.block(obstacles);
        grid
    }

    fn block<I>(&mut self, obstacles: I)
    where
        I: IntoIterator<Item = CellCoord>,
    {
        for obstacle in obstacles {
            if let Some(index) = self.index(obstacle) {
                self.walkable[index] = false;
            }
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells, walkable or not.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.walkable.len()
    }

    /// Number of walkable cells.
    #[must_use]
    pub fn walkable_cell_count(&self) -> usize {
        self.walkable.iter().filter(|walkable| **walkable).count()
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// Reports whether the cell lies inside the grid and is not an obstacle.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.walkable.get(index).copied())
            .unwrap_or(false)
    }

    /// Walkable cardinal neighbours in the order up, right, down, left.
    pub fn walkable_neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        neighbors(cell, self.width, self.height)
            .filter(move |neighbor| self.is_walkable(*neighbor))
    }

    /// Row-major offset of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

fn neighbors(cell: CellCoord, width: u32, height: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_add(1) {
        if column < width {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < height {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}
