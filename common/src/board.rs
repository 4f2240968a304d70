use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;

use crate::{Cell, neighbors};

/// Ground-truth mine placement.
///
/// The inference engine never looks at this; only the game driver does, to
/// decide what a reveal shows.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Board {
    height: usize,
    width: usize,
    mines: BTreeSet<Cell>,
}

impl Board {
    /// Places `mines` mines uniformly at random.
    pub fn new<R>(height: usize, width: usize, mines: usize, rng: &mut R) -> anyhow::Result<Self>
    where
        R: Rng + ?Sized,
    {
        let total = height * width;
        anyhow::ensure!(total > 0, "board must have at least one cell");
        anyhow::ensure!(
            mines <= total,
            "cannot place {mines} mines on a {height}x{width} board"
        );

        let mines = rand::seq::index::sample(rng, total, mines)
            .into_iter()
            .map(|index| Cell::new(index / width, index % width))
            .collect();
        Ok(Board {
            height,
            width,
            mines,
        })
    }

    /// A board with mines exactly at `mines`.
    pub fn with_mines(
        height: usize,
        width: usize,
        mines: impl IntoIterator<Item = Cell>,
    ) -> anyhow::Result<Self> {
        let mines: BTreeSet<Cell> = mines.into_iter().collect();
        if let Some(cell) = mines.iter().find(|cell| !cell.in_bounds(height, width)) {
            anyhow::bail!("mine {cell} lies outside the {height}x{width} board");
        }
        Ok(Board {
            height,
            width,
            mines,
        })
    }

    /// `(height, width)`.
    pub fn bounds(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.in_bounds(self.height, self.width)
    }

    pub fn mines(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    /// Number of mines among the cells surrounding `cell`.
    pub fn adjacent_mine_count(&self, cell: Cell) -> usize {
        neighbors(cell, self.height, self.width)
            .filter(|neighbor| self.is_mine(*neighbor))
            .count()
    }

    /// Whether `flagged` is exactly the set of mines.
    pub fn won(&self, flagged: &BTreeSet<Cell>) -> bool {
        *flagged == self.mines
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let divider = format!("{}-", "--".repeat(self.width));
        for row in 0..self.height {
            writeln!(f, "{divider}")?;
            for col in 0..self.width {
                let mark = if self.is_mine(Cell::new(row, col)) { 'X' } else { ' ' };
                write!(f, "|{mark}")?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{divider}")
    }
}
