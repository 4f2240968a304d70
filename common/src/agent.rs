use std::collections::BTreeSet;

use rand::Rng;

use crate::{Cell, Deductions, KnowledgeBase, KnowledgeError};

/// A move recommended by the [`Agent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// The cell is known to be safe.
    Certain(Cell),
    /// Nothing is known to be safe; the cell was picked at random.
    Guess(Cell),
}

impl Move {
    pub fn cell(self) -> Cell {
        match self {
            Move::Certain(cell) | Move::Guess(cell) => cell,
        }
    }
}

/// Plays a board by feeding what it sees to a [`KnowledgeBase`].
///
/// Strategy: reveal a cell known to be safe if there is one, otherwise guess
/// among the cells not yet played and not known to be mines.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Agent {
    knowledge: KnowledgeBase,
    moves_made: BTreeSet<Cell>,
}

impl Agent {
    pub fn new(height: usize, width: usize) -> Self {
        Agent {
            knowledge: KnowledgeBase::new(height, width),
            moves_made: BTreeSet::new(),
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        &self.moves_made
    }

    /// Records a move that did not produce an observation, such as a mine hit.
    pub fn mark_move(&mut self, cell: Cell) {
        self.moves_made.insert(cell);
    }

    /// Records that `cell` was revealed safe with `count` adjacent mines.
    /// Nothing is recorded if the observation is rejected.
    pub fn observe(&mut self, cell: Cell, count: usize) -> Result<Deductions, KnowledgeError> {
        let deductions = self.knowledge.integrate(cell, count)?;
        self.moves_made.insert(cell);
        Ok(deductions)
    }

    /// The next cell to reveal, or `None` if every cell is played or known
    /// to be a mine.
    pub fn next_move<R>(&self, rng: &mut R) -> Option<Move>
    where
        R: Rng + ?Sized,
    {
        if let Some(cell) = self.knowledge.next_certain_safe_move(&self.moves_made) {
            return Some(Move::Certain(cell));
        }
        self.knowledge
            .next_random_move(&self.moves_made, rng)
            .map(Move::Guess)
    }
}
