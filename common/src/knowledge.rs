use std::collections::HashSet;

use crate::constraint::Constraint;
use crate::error::{Error, Result};
use crate::grid::Cell;

/// Everything the player knows about the board.
///
/// Cells are partitioned into moves already made, cells proven safe and cells
/// proven mines, alongside the live constraints over the cells still undetermined.
/// The inference engine is the only writer; move selection only reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    pub(crate) moves_made: HashSet<Cell>,
    pub(crate) safe: HashSet<Cell>,
    pub(crate) mines: HashSet<Cell>,
    pub(crate) constraints: Vec<Constraint>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cells the player has already revealed.
    pub fn moves_made(&self) -> &HashSet<Cell> {
        &self.moves_made
    }

    /// Cells proven free of mines, played or not.
    pub fn safe(&self) -> &HashSet<Cell> {
        &self.safe
    }

    /// Cells proven to hold a mine.
    pub fn mines(&self) -> &HashSet<Cell> {
        &self.mines
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_resolved(&self, cell: Cell) -> bool {
        self.safe.contains(&cell) || self.mines.contains(&cell)
    }

    /// Marks a cell as played. Returns false if it already was.
    pub fn record_move(&mut self, cell: Cell) -> bool {
        self.moves_made.insert(cell)
    }

    /// Records `cell` as a mine and strips it from every live constraint.
    ///
    /// Either every constraint accepts the cell or the store is left untouched.
    /// This does not look for follow-up deductions; the engine's fixpoint does that.
    pub fn declare_mine(&mut self, cell: Cell) -> Result<bool> {
        if self.safe.contains(&cell) {
            return Err(Error::contradiction(
                [&cell],
                1,
                "cell is already known to be safe",
            ));
        }
        let constraints = self
            .constraints
            .iter()
            .cloned()
            .map(|mut constraint| constraint.resolve_as_mine(cell).map(|_| constraint))
            .collect::<Result<Vec<_>>>()?;
        self.constraints = constraints;
        Ok(self.mines.insert(cell))
    }

    /// Records `cell` as safe and strips it from every live constraint.
    pub fn declare_safe(&mut self, cell: Cell) -> Result<bool> {
        if self.mines.contains(&cell) {
            return Err(Error::contradiction(
                [&cell],
                0,
                "cell is already known to be a mine",
            ));
        }
        let constraints = self
            .constraints
            .iter()
            .cloned()
            .map(|mut constraint| constraint.resolve_as_safe(cell).map(|_| constraint))
            .collect::<Result<Vec<_>>>()?;
        self.constraints = constraints;
        Ok(self.safe.insert(cell))
    }

    /// Adds a constraint unless it is empty or already known.
    ///
    /// A constraint over the same cells as a live one but with a different count is a
    /// contradiction.
    pub fn insert_constraint(&mut self, constraint: Constraint) -> Result<bool> {
        if constraint.is_empty() {
            return Ok(false);
        }
        if let Some(existing) = self
            .constraints
            .iter()
            .find(|c| c.cells() == constraint.cells())
        {
            if existing.count() != constraint.count() {
                return Err(Error::contradiction(
                    constraint.cells(),
                    constraint.count(),
                    format!("conflicts with {existing}"),
                ));
            }
            return Ok(false);
        }
        self.constraints.push(constraint);
        Ok(true)
    }

    /// Sum of the cells over all live constraints.
    /// Every inference step strictly lowers it, which bounds the fixpoint loop.
    pub fn potential(&self) -> usize {
        self.constraints.iter().map(Constraint::len).sum()
    }

    /// Checks the invariants that must hold between any two engine calls.
    pub fn check_invariants(&self) -> Result<()> {
        if let Some(cell) = self.safe.intersection(&self.mines).next() {
            return Err(Error::contradiction(
                [cell],
                0,
                "cell is both safe and a mine",
            ));
        }
        for constraint in &self.constraints {
            if constraint.count() > constraint.len() {
                return Err(Error::contradiction(
                    constraint.cells(),
                    constraint.count(),
                    "more mines than cells",
                ));
            }
            if let Some(cell) = constraint
                .cells()
                .iter()
                .find(|c| self.is_resolved(**c) || self.moves_made.contains(*c))
            {
                return Err(Error::contradiction(
                    constraint.cells(),
                    constraint.count(),
                    format!("{cell} is already resolved"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(coords: &[(usize, usize)], count: usize) -> Constraint {
        Constraint::new(coords.iter().copied().map(Cell::from), count).unwrap()
    }

    #[test]
    fn test_declare_mine_updates_constraints() {
        let mut kb = KnowledgeBase::new();
        kb.insert_constraint(constraint(&[(0, 0), (0, 1), (1, 0)], 2))
            .unwrap();

        assert!(kb.declare_mine(Cell::new(0, 1)).unwrap());
        assert!(kb.mines().contains(&Cell::new(0, 1)));
        assert_eq!(kb.constraints()[0], constraint(&[(0, 0), (1, 0)], 1));

        // Declaring twice reports nothing new
        assert!(!kb.declare_mine(Cell::new(0, 1)).unwrap());
        kb.check_invariants().unwrap();
    }

    #[test]
    fn test_declare_safe_updates_constraints() {
        let mut kb = KnowledgeBase::new();
        kb.insert_constraint(constraint(&[(0, 0), (0, 1), (1, 0)], 1))
            .unwrap();

        assert!(kb.declare_safe(Cell::new(1, 0)).unwrap());
        assert!(kb.safe().contains(&Cell::new(1, 0)));
        assert_eq!(kb.constraints()[0], constraint(&[(0, 0), (0, 1)], 1));
        kb.check_invariants().unwrap();
    }

    #[test]
    fn test_safe_and_mines_stay_disjoint() {
        let mut kb = KnowledgeBase::new();
        kb.declare_safe(Cell::new(2, 2)).unwrap();
        assert!(kb.declare_mine(Cell::new(2, 2)).is_err());

        kb.declare_mine(Cell::new(3, 3)).unwrap();
        assert!(kb.declare_safe(Cell::new(3, 3)).is_err());
    }

    #[test]
    fn test_failed_declare_leaves_store_untouched() {
        let mut kb = KnowledgeBase::new();
        kb.insert_constraint(constraint(&[(0, 0), (0, 1)], 1)).unwrap();
        kb.insert_constraint(constraint(&[(0, 0), (1, 0)], 0)).unwrap();
        let before = kb.clone();

        // The second constraint rules out a mine after the first already accepted it
        let err = kb.declare_mine(Cell::new(0, 0)).unwrap_err();
        assert!(matches!(err, Error::ContradictionDetected { .. }));
        assert_eq!(kb, before);
        kb.check_invariants().unwrap();

        let mut kb = KnowledgeBase::new();
        kb.insert_constraint(constraint(&[(0, 0), (0, 1)], 1)).unwrap();
        kb.insert_constraint(constraint(&[(0, 0), (1, 0)], 2)).unwrap();
        let before = kb.clone();

        let err = kb.declare_safe(Cell::new(0, 0)).unwrap_err();
        assert!(matches!(err, Error::ContradictionDetected { .. }));
        assert_eq!(kb, before);
        kb.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_constraint_dedups_structurally() {
        let mut kb = KnowledgeBase::new();
        assert!(kb.insert_constraint(constraint(&[(0, 0), (0, 1)], 1)).unwrap());
        assert!(!kb.insert_constraint(constraint(&[(0, 1), (0, 0)], 1)).unwrap());
        assert!(!kb.insert_constraint(constraint(&[], 0)).unwrap());
        assert_eq!(kb.constraints().len(), 1);
        assert_eq!(kb.potential(), 2);
    }

    #[test]
    fn test_insert_constraint_rejects_conflicting_count() {
        let mut kb = KnowledgeBase::new();
        kb.insert_constraint(constraint(&[(0, 0), (0, 1)], 1)).unwrap();
        let err = kb
            .insert_constraint(constraint(&[(0, 0), (0, 1)], 2))
            .unwrap_err();
        assert!(matches!(err, Error::ContradictionDetected { .. }));
    }

    #[test]
    fn test_check_invariants_flags_stale_cells() {
        let mut kb = KnowledgeBase::new();
        kb.insert_constraint(constraint(&[(0, 0), (0, 1)], 1)).unwrap();
        kb.record_move(Cell::new(0, 0));
        assert!(kb.check_invariants().is_err());
    }
}
