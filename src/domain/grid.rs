/// The character grid: the single source of truth for display content.
///
/// Fully populated at all times — every position in
/// `[0, rows) × [0, cols)` holds exactly one cell. Dimensions are fixed
/// for the lifetime of a session; out-of-range writes are dropped rather
/// than growing the grid.

use crate::domain::cell::Cell;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GridDims {
    pub rows: usize,
    pub cols: usize,
}

pub struct CharGrid {
    cells: Vec<Vec<Cell>>,
    dims: GridDims,
}

impl CharGrid {
    /// A fully populated grid of blank noise cells.
    pub fn new(dims: GridDims) -> Self {
        CharGrid {
            cells: vec![vec![Cell::noise(' '); dims.cols]; dims.rows],
            dims,
        }
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Replace the cell at (row, col). Silently dropped out of range.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if row < self.dims.rows && col < self.dims.cols {
            self.cells[row][col] = cell;
        }
    }

    /// Mutate the cell at (row, col) in place.
    #[inline]
    pub fn update(&mut self, row: usize, col: usize, f: impl FnOnce(&mut Cell)) {
        if row < self.dims.rows && col < self.dims.cols {
            f(&mut self.cells[row][col]);
        }
    }

    /// Iterate all (row, col, cell) triples.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Cell)> {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter().enumerate().map(move |(c, cell)| (r, c, cell))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_fully_populated() {
        let grid = CharGrid::new(GridDims { rows: 4, cols: 7 });
        let mut count = 0;
        for r in 0..4 {
            for c in 0..7 {
                assert!(grid.get(r, c).is_some());
                count += 1;
            }
        }
        assert_eq!(count, grid.iter().count());
    }

    #[test]
    fn out_of_range_access_is_safe() {
        let mut grid = CharGrid::new(GridDims { rows: 2, cols: 2 });
        assert!(grid.get(2, 0).is_none());
        assert!(grid.get(0, 2).is_none());
        grid.set(9, 9, Cell::noise('x')); // dropped
        assert_eq!(grid.iter().count(), 4);
    }

    #[test]
    fn set_and_get_round_trip() {
        let mut grid = CharGrid::new(GridDims { rows: 2, cols: 2 });
        grid.set(1, 1, Cell::noise('q'));
        assert_eq!(grid.get(1, 1).map(|c| c.content), Some('q'));
    }
}
