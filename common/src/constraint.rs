use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

use crate::Cell;

/// A statement that exactly `count` of `cells` are mines.
///
/// Each constraint owns its own cell set. The only mutations after
/// construction are [`Constraint::declare_mine`] and
/// [`Constraint::declare_safe`], both of which shrink the set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Constraint {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl Constraint {
    /// Creates a constraint, or `None` if `count` exceeds the number of cells.
    pub fn try_new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Option<Self> {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        (count <= cells.len()).then_some(Constraint { cells, count })
    }

    /// Creates a constraint, panicking if `count` exceeds the number of cells.
    #[cfg(test)]
    pub(crate) fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Self {
        match Self::try_new(cells, count) {
            Some(constraint) => constraint,
            None => panic!("Mine count must not exceed the number of cells."),
        }
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Every cell, if the count says they all must be mines.
    pub fn implied_mines(&self) -> BTreeSet<Cell> {
        // An empty constraint is vacuous, not a mine assertion.
        if self.count > 0 && self.count == self.cells.len() {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Every cell, if the count says none of them can be a mine.
    pub fn implied_safe(&self) -> BTreeSet<Cell> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Whether `cell` may be a mine without breaking this constraint.
    pub fn admits_mine(&self, cell: Cell) -> bool {
        self.count > 0 || !self.cells.contains(&cell)
    }

    /// Whether `cell` may be safe without breaking this constraint.
    pub fn admits_safe(&self, cell: Cell) -> bool {
        self.count < self.cells.len() || !self.cells.contains(&cell)
    }

    /// Removes a known mine, which accounts for one of the counted mines.
    /// Returns whether the constraint changed.
    ///
    /// A mine this constraint cannot admit (see [`Constraint::admits_mine`])
    /// is left in place and reported as unchanged, the same as an absent
    /// cell. Callers check admissibility first to tell the two apart.
    pub(crate) fn declare_mine(&mut self, cell: Cell) -> bool {
        if !self.admits_mine(cell) || !self.cells.remove(&cell) {
            return false;
        }
        self.count -= 1;
        true
    }

    /// Removes a known safe cell. Returns whether the constraint changed.
    ///
    /// Like [`Constraint::declare_mine`], an inadmissible cell is left in
    /// place; callers check [`Constraint::admits_safe`] first.
    pub(crate) fn declare_safe(&mut self, cell: Cell) -> bool {
        self.admits_safe(cell) && self.cells.remove(&cell)
    }

    pub fn is_subset_of(&self, other: &Constraint) -> bool {
        self.cells.is_subset(&other.cells)
    }

    /// The constraint on `other`'s cells outside `self`, given
    /// `self.cells ⊆ other.cells`.
    ///
    /// Returns `None` when the counts cannot both hold.
    pub fn difference_from(&self, other: &Constraint) -> Option<Constraint> {
        debug_assert!(self.is_subset_of(other));
        let count = other.count.checked_sub(self.count)?;
        Self::try_new(other.cells.difference(&self.cells).copied(), count)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} = {}", self.cells.iter().join(", "), self.count)
    }
}
