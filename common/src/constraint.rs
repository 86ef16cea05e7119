use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::grid::Cell;

/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// Two constraints are equal when they cover the same cells with the same count.
/// `count` never exceeds the number of cells; every operation that would break
/// that bound fails with [`Error::ContradictionDetected`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl Constraint {
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Result<Self> {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        if count > cells.len() {
            return Err(Error::contradiction(
                &cells,
                count,
                "more mines than cells",
            ));
        }
        Ok(Constraint { cells, count })
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// All cells are mines when the count covers every one of them.
    pub fn known_mines(&self) -> Option<&BTreeSet<Cell>> {
        (!self.cells.is_empty() && self.count == self.cells.len()).then_some(&self.cells)
    }

    /// All cells are safe when the count is zero. Vacuously true for an empty constraint.
    pub fn known_safe(&self) -> Option<&BTreeSet<Cell>> {
        (self.count == 0).then_some(&self.cells)
    }

    /// Strips a cell now known to be a mine, which accounts for one of the counted mines.
    /// Returns whether the constraint changed.
    pub fn resolve_as_mine(&mut self, cell: Cell) -> Result<bool> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        if self.count == 0 {
            return Err(Error::contradiction(
                &self.cells,
                self.count,
                format!("{cell} is a mine but none remain"),
            ));
        }
        self.cells.remove(&cell);
        self.count -= 1;
        Ok(true)
    }

    /// Strips a cell now known to be safe; the count is untouched.
    /// Returns whether the constraint changed.
    pub fn resolve_as_safe(&mut self, cell: Cell) -> Result<bool> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        if self.count == self.cells.len() {
            return Err(Error::contradiction(
                &self.cells,
                self.count,
                format!("{cell} is safe but every cell must be a mine"),
            ));
        }
        self.cells.remove(&cell);
        Ok(true)
    }

    /// True when `self` covers a strict subset of `other`'s cells.
    pub fn is_strict_subset_of(&self, other: &Constraint) -> bool {
        self.cells.len() < other.cells.len() && self.cells.is_subset(&other.cells)
    }

    /// Subset elimination: with `subset` contained in `self`, the cells outside the subset
    /// hold exactly the mines the subset does not account for.
    pub fn eliminate(&self, subset: &Constraint) -> Result<Constraint> {
        debug_assert!(subset.is_strict_subset_of(self));

        let count = self.count.checked_sub(subset.count).ok_or_else(|| {
            Error::contradiction(
                &self.cells,
                self.count,
                format!("subset {subset} holds more mines"),
            )
        })?;
        Constraint::new(self.cells.difference(&subset.cells).copied(), count)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} = {}", self.cells.iter().join(", "), self.count)
    }
}
