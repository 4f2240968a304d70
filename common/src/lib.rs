//! Rule-based minesweeper deduction.
//!
//! The heart of the crate is [`KnowledgeBase`], which collects
//! "exactly `n` of these cells are mines" [`Constraint`]s and closes them
//! under a fixed-point inference to find cells that are certainly mines or
//! certainly safe. [`Board`], [`Agent`] and [`Game`] are the collaborators
//! around it: ground truth, move selection and a playable session.

use std::fmt;

mod agent;
mod board;
mod constraint;
mod game;
mod knowledge;

pub use agent::{Agent, Move};
pub use board::Board;
pub use constraint::Constraint;
pub use game::{Game, GameState, Tile};
pub use knowledge::{Deductions, KnowledgeBase, KnowledgeError};

/// A zero-based `(row, col)` coordinate on the board.
///
/// Ordering is row-major, so sets of cells iterate top-left to bottom-right.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }

    /// Whether the cell lies on a `height` x `width` board.
    pub const fn in_bounds(self, height: usize, width: usize) -> bool {
        self.row < height && self.col < width
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

/// All in-bounds cells surrounding `cell`, excluding `cell` itself.
/// Handles board edges and corners.
pub fn neighbors(cell: Cell, height: usize, width: usize) -> impl Iterator<Item = Cell> {
    (-1..=1isize).flat_map(move |dr| {
        (-1..=1isize).filter_map(move |dc| {
            if dr == 0 && dc == 0 {
                return None;
            }

            let row = cell.row.checked_add_signed(dr)?;
            let col = cell.col.checked_add_signed(dc)?;
            let neighbor = Cell { row, col };
            neighbor.in_bounds(height, width).then_some(neighbor)
        })
    })
}

/// Every cell of a `height` x `width` board in row-major order.
pub fn all_cells(height: usize, width: usize) -> impl Iterator<Item = Cell> {
    itertools::iproduct!(0..height, 0..width).map(Cell::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors() {
        // Corner cell should have 3 neighbors
        let corner: Vec<Cell> = neighbors(Cell::new(0, 0), 3, 3).collect();
        assert_eq!(corner, vec![Cell::new(0, 1), Cell::new(1, 0), Cell::new(1, 1)]);

        // Center cell should have 8 neighbors
        assert_eq!(neighbors(Cell::new(1, 1), 3, 3).count(), 8);

        // Edge cell should have 5 neighbors
        assert_eq!(neighbors(Cell::new(0, 1), 3, 3).count(), 5);

        // A single-cell board has no neighbors at all
        assert_eq!(neighbors(Cell::new(0, 0), 1, 1).count(), 0);
    }

    #[test]
    fn test_all_cells_row_major() {
        let cells: Vec<Cell> = all_cells(2, 3).collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], Cell::new(0, 0));
        assert_eq!(cells[3], Cell::new(1, 0));
        assert!(cells.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::new(2, 7).to_string(), "(2, 7)");
        assert!(Cell::new(2, 7).in_bounds(3, 8));
        assert!(!Cell::new(3, 0).in_bounds(3, 8));
    }
}
