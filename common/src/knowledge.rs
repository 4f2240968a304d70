use std::collections::BTreeSet;
use std::mem;

use itertools::{Itertools, iproduct};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::{Cell, Constraint, all_cells, neighbors};

/// Failures of [`KnowledgeBase`] operations.
///
/// All of these mean the caller broke a precondition or fed observations
/// that disagree with each other. The operation is aborted; nothing is
/// retried or patched up.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum KnowledgeError {
    #[display("cell {cell} lies outside the {height}x{width} board")]
    OutOfBounds {
        cell: Cell,
        height: usize,
        width: usize,
    },
    #[display("cell {cell} has already been integrated")]
    AlreadyResolved { cell: Cell },
    #[display("cell {cell} reports {count} adjacent mines, but {known_mines} are known and {unknown} are undecided")]
    InconsistentCount {
        cell: Cell,
        count: usize,
        known_mines: usize,
        unknown: usize,
    },
    #[display("cell {cell} is required to be both a mine and safe")]
    Contradiction { cell: Cell },
    #[display("subset resolution derived an impossible constraint from {subset} and {superset}")]
    ImpossibleConstraint {
        subset: Constraint,
        superset: Constraint,
    },
}

/// Cells newly classified by one [`KnowledgeBase::integrate`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deductions {
    pub mines: BTreeSet<Cell>,
    pub safe: BTreeSet<Cell>,
}

impl Deductions {
    pub fn is_empty(&self) -> bool {
        self.mines.is_empty() && self.safe.is_empty()
    }
}

/// Everything known about the hidden state of one board.
///
/// Grows monotonically over a game: cells only ever move from unknown to
/// known mine or known safe, and constraints only shrink or are replaced by
/// smaller derived ones.
///
/// Invariants:
/// * `known_mines` and `known_safe` are disjoint.
/// * No classified cell appears in any constraint.
/// * No two constraints are structurally equal.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KnowledgeBase {
    height: usize,
    width: usize,
    constraints: Vec<Constraint>,
    known_mines: BTreeSet<Cell>,
    known_safe: BTreeSet<Cell>,
    resolved_cells: BTreeSet<Cell>,
}

impl KnowledgeBase {
    pub fn new(height: usize, width: usize) -> Self {
        KnowledgeBase {
            height,
            width,
            constraints: Vec::new(),
            known_mines: BTreeSet::new(),
            known_safe: BTreeSet::new(),
            resolved_cells: BTreeSet::new(),
        }
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

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn known_mines(&self) -> &BTreeSet<Cell> {
        &self.known_mines
    }

    pub fn known_safe(&self) -> &BTreeSet<Cell> {
        &self.known_safe
    }

    /// Cells whose observation has already been integrated.
    pub fn resolved_cells(&self) -> &BTreeSet<Cell> {
        &self.resolved_cells
    }

    /// Records `cell` as a mine and removes it from every constraint.
    ///
    /// Returns `Ok(false)` if the cell was already a known mine.
    pub fn declare_mine(&mut self, cell: Cell) -> Result<bool, KnowledgeError> {
        if self.known_mines.contains(&cell) {
            return Ok(false);
        }
        self.check_mine(cell)?;

        self.known_mines.insert(cell);
        for constraint in &mut self.constraints {
            constraint.declare_mine(cell);
        }
        Ok(true)
    }

    /// Records `cell` as safe and removes it from every constraint.
    ///
    /// Returns `Ok(false)` if the cell was already known safe.
    pub fn declare_safe(&mut self, cell: Cell) -> Result<bool, KnowledgeError> {
        if self.known_safe.contains(&cell) {
            return Ok(false);
        }
        self.check_safe(cell)?;

        self.known_safe.insert(cell);
        for constraint in &mut self.constraints {
            constraint.declare_safe(cell);
        }
        Ok(true)
    }

    fn check_mine(&self, cell: Cell) -> Result<(), KnowledgeError> {
        if self.known_safe.contains(&cell) || !self.constraints.iter().all(|c| c.admits_mine(cell))
        {
            return Err(KnowledgeError::Contradiction { cell });
        }
        Ok(())
    }

    fn check_safe(&self, cell: Cell) -> Result<(), KnowledgeError> {
        if self.known_mines.contains(&cell) || !self.constraints.iter().all(|c| c.admits_safe(cell))
        {
            return Err(KnowledgeError::Contradiction { cell });
        }
        Ok(())
    }

    /// Integrates the observation that the safe `cell` has `count` adjacent
    /// mines, then closes the knowledge base under inference.
    ///
    /// Must be called at most once per cell. On error nothing is changed, so
    /// a corrected observation for the same cell can still be integrated.
    ///
    /// The closure compares constraints pairwise, so a pass costs O(n²) in
    /// the number of constraints and passes may add constraints. That is
    /// fine for the boards this is played on (tens to a few hundred cells)
    /// but is not polynomially bounded in general.
    pub fn integrate(&mut self, cell: Cell, count: usize) -> Result<Deductions, KnowledgeError> {
        if !self.contains(cell) {
            return Err(KnowledgeError::OutOfBounds {
                cell,
                height: self.height,
                width: self.width,
            });
        }
        if self.resolved_cells.contains(&cell) {
            return Err(KnowledgeError::AlreadyResolved { cell });
        }
        self.check_safe(cell)?;

        // The cell is not its own neighbor, so this does not depend on
        // declaring it safe first.
        let mut known_mines = 0;
        let mut unknown = BTreeSet::new();
        for neighbor in neighbors(cell, self.height, self.width) {
            if self.known_mines.contains(&neighbor) {
                known_mines += 1;
            } else if !self.known_safe.contains(&neighbor) {
                unknown.insert(neighbor);
            }
        }
        let constraint = count
            .checked_sub(known_mines)
            .and_then(|remaining| Constraint::try_new(unknown.iter().copied(), remaining))
            .ok_or(KnowledgeError::InconsistentCount {
                cell,
                count,
                known_mines,
                unknown: unknown.len(),
            })?;

        // The closure can still uncover a contradiction, so it runs on a
        // copy that replaces `self` only once it succeeds.
        let mut next = self.clone();
        let mut deductions = Deductions::default();
        next.resolved_cells.insert(cell);
        if next.declare_safe(cell)? {
            deductions.safe.insert(cell);
        }

        log::debug!("integrating {cell} with count {count}: {constraint}");
        if !next.constraints.contains(&constraint) {
            next.constraints.push(constraint);
        }

        next.close(&mut deductions)?;
        *self = next;
        Ok(deductions)
    }

    /// Runs inference passes until one changes nothing.
    ///
    /// Each pass computes its results into buffers before applying them, so
    /// no collection is modified while it is being scanned.
    fn close(&mut self, deductions: &mut Deductions) -> Result<(), KnowledgeError> {
        let mut passes = 0;
        loop {
            passes += 1;
            let mut changed = false;

            let mut mines = BTreeSet::new();
            let mut safe = BTreeSet::new();
            for constraint in &self.constraints {
                mines.extend(constraint.implied_mines());
                safe.extend(constraint.implied_safe());
            }
            if let Some(&cell) = mines.intersection(&safe).next() {
                return Err(KnowledgeError::Contradiction { cell });
            }

            for cell in mines {
                if self.declare_mine(cell)? {
                    deductions.mines.insert(cell);
                    changed = true;
                }
            }
            for cell in safe {
                if self.declare_safe(cell)? {
                    deductions.safe.insert(cell);
                    changed = true;
                }
            }

            // Declarations can both empty constraints and make two equal.
            let before = self.constraints.len();
            self.constraints = mem::take(&mut self.constraints)
                .into_iter()
                .filter(|c| !c.is_empty())
                .unique()
                .collect();
            changed |= self.constraints.len() != before;

            let derived = self.resolve_subsets()?;
            if !derived.is_empty() {
                changed = true;
                self.constraints.extend(derived);
            }

            if !changed {
                break;
            }
        }

        log::debug!(
            "fixed point after {passes} passes: {} constraints, {} mines, {} safe",
            self.constraints.len(),
            self.known_mines.len(),
            self.known_safe.len()
        );
        Ok(())
    }

    /// Derives `B − A` for every pair of distinct constraints with
    /// `A ⊆ B` and `count(A) <= count(B)`, keeping only new ones.
    fn resolve_subsets(&self) -> Result<Vec<Constraint>, KnowledgeError> {
        let mut derived: Vec<Constraint> = Vec::new();
        for (subset, superset) in iproduct!(&self.constraints, &self.constraints) {
            // Compared structurally, not by position.
            if subset == superset
                || subset.count() > superset.count()
                || !subset.is_subset_of(superset)
            {
                continue;
            }

            let candidate = subset.difference_from(superset).ok_or_else(|| {
                KnowledgeError::ImpossibleConstraint {
                    subset: subset.clone(),
                    superset: superset.clone(),
                }
            })?;
            if !self.constraints.contains(&candidate) && !derived.contains(&candidate) {
                log::trace!("derived {candidate} from {superset} minus {subset}");
                derived.push(candidate);
            }
        }
        Ok(derived)
    }

    /// A known-safe cell outside `exclude`, if any. The smallest one is
    /// returned so the choice is deterministic.
    pub fn next_certain_safe_move(&self, exclude: &BTreeSet<Cell>) -> Option<Cell> {
        self.known_safe.difference(exclude).next().copied()
    }

    /// A uniformly random cell that is neither in `exclude` nor a known mine.
    pub fn next_random_move<R>(&self, exclude: &BTreeSet<Cell>, rng: &mut R) -> Option<Cell>
    where
        R: Rng + ?Sized,
    {
        let candidates: Vec<Cell> = all_cells(self.height, self.width)
            .filter(|cell| !exclude.contains(cell) && !self.known_mines.contains(cell))
            .collect();
        candidates.choose(rng).copied()
    }
}
