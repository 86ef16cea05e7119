use std::collections::{BTreeSet, HashSet};

use rand::Rng;

use crate::board::{Board, Tile};
use crate::constraint::Constraint;
use crate::error::{Error, Result};
use crate::grid::{Cell, Grid};
use crate::knowledge::KnowledgeBase;
use crate::moves;

/// Cells newly proven by a single engine call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inference {
    /// Newly proven safe cells that have not been played yet.
    pub safe: BTreeSet<Cell>,
    /// Newly proven mines.
    pub mines: BTreeSet<Cell>,
}

impl Inference {
    fn between(before: &KnowledgeBase, after: &KnowledgeBase) -> Self {
        Inference {
            safe: after
                .safe()
                .iter()
                .filter(|c| !before.safe().contains(c) && !after.moves_made().contains(c))
                .copied()
                .collect(),
            mines: after
                .mines()
                .difference(before.mines())
                .copied()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.safe.is_empty() && self.mines.is_empty()
    }
}

/// Propositional inference over the constraints revealed cells impose on their neighbors.
///
/// Every call runs to a fixpoint before returning: trivially known cells are declared,
/// constraints are reduced by subset elimination, and this repeats until a full pass
/// derives nothing new. A call that fails leaves the knowledge base as it was.
#[derive(Debug, Clone)]
pub struct Engine {
    grid: Grid,
    knowledge: KnowledgeBase,
}

impl Engine {
    pub fn new(grid: Grid) -> Self {
        Engine {
            grid,
            knowledge: KnowledgeBase::new(),
        }
    }

    /// Rebuilds the knowledge a player would have from the visible board,
    /// observing every revealed tile in row-major order.
    pub fn from_board(board: &Board) -> Result<Self> {
        let mut engine = Engine::new(board.grid());
        for cell in board.grid().cells() {
            if let Some(Tile::Revealed(count)) = board.tile(cell) {
                engine.observe(cell, count as usize)?;
            }
        }
        Ok(engine)
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn moves_made(&self) -> &HashSet<Cell> {
        self.knowledge.moves_made()
    }

    pub fn safe(&self) -> &HashSet<Cell> {
        self.knowledge.safe()
    }

    pub fn mines(&self) -> &HashSet<Cell> {
        self.knowledge.mines()
    }

    /// Takes in a revealed cell and the number of mines among its neighbors.
    ///
    /// Each cell may be observed once. `count` must not exceed the number of
    /// in-bounds neighbors.
    pub fn observe(&mut self, cell: Cell, count: usize) -> Result<Inference> {
        if !self.grid.contains(cell) {
            return Err(Error::invalid_move(cell, "outside the board"));
        }
        if self.knowledge.moves_made().contains(&cell) {
            return Err(Error::invalid_move(cell, "already observed"));
        }
        let neighbors: Vec<Cell> = self.grid.neighbors(cell).collect();
        if count > neighbors.len() {
            return Err(Error::invalid_move(
                cell,
                format!("{count} mines around a cell with {} neighbors", neighbors.len()),
            ));
        }

        self.transaction(|kb| {
            kb.record_move(cell);
            kb.declare_safe(cell)?;

            let unplayed = neighbors
                .into_iter()
                .filter(|n| !kb.moves_made().contains(n));
            let constraint = resolve_against_facts(kb, Constraint::new(unplayed, count)?)?;
            kb.insert_constraint(constraint)?;

            settle(kb).map(|_| ())
        })
    }

    /// Adds a statement known from outside the board's reveals, then runs to a fixpoint.
    pub fn assert_constraint(&mut self, constraint: Constraint) -> Result<Inference> {
        if let Some(&cell) = constraint.cells().iter().find(|c| !self.grid.contains(**c)) {
            return Err(Error::invalid_move(cell, "outside the board"));
        }

        self.transaction(|kb| {
            let constraint = resolve_against_facts(kb, constraint)?;
            kb.insert_constraint(constraint)?;
            settle(kb).map(|_| ())
        })
    }

    /// Runs the fixpoint loop without new input. Returns whether anything changed.
    pub fn settle(&mut self) -> Result<bool> {
        let before = self.knowledge.clone();
        settle(&mut self.knowledge).inspect_err(|_| self.knowledge = before)
    }

    pub fn pick_safe_move(&self) -> Option<Cell> {
        moves::pick_safe_move(&self.knowledge)
    }

    pub fn pick_random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        moves::pick_random_move(&self.knowledge, self.grid, rng)
    }

    fn transaction(
        &mut self,
        update: impl FnOnce(&mut KnowledgeBase) -> Result<()>,
    ) -> Result<Inference> {
        let before = self.knowledge.clone();
        match update(&mut self.knowledge) {
            Ok(()) => Ok(Inference::between(&before, &self.knowledge)),
            Err(err) => {
                self.knowledge = before;
                Err(err)
            }
        }
    }
}

/// Strips cells whose status is already known from a constraint about to enter the store.
fn resolve_against_facts(kb: &KnowledgeBase, mut constraint: Constraint) -> Result<Constraint> {
    let cells: Vec<Cell> = constraint.cells().iter().copied().collect();
    for cell in cells {
        if kb.safe().contains(&cell) || kb.moves_made().contains(&cell) {
            constraint.resolve_as_safe(cell)?;
        } else if kb.mines().contains(&cell) {
            constraint.resolve_as_mine(cell)?;
        }
    }
    Ok(constraint)
}

/// Repeats resolution and subset elimination until a full pass changes nothing.
///
/// Each productive pass either proves a new cell or lowers the store's potential,
/// so the loop is bounded by the board size plus the initial potential.
fn settle(kb: &mut KnowledgeBase) -> Result<bool> {
    let mut changed = false;
    loop {
        let facts = kb.safe().len() + kb.mines().len();
        let potential = kb.potential();

        resolve_known(kb)?;
        eliminate_subsets(kb)?;

        if kb.safe().len() + kb.mines().len() == facts && kb.potential() == potential {
            return Ok(changed);
        }
        changed = true;
    }
}

/// Declares the cells of every all-safe or all-mine constraint and drops the emptied
/// constraints, repeating while declarations expose more of them.
fn resolve_known(kb: &mut KnowledgeBase) -> Result<()> {
    loop {
        let mut safe = BTreeSet::new();
        let mut mines = BTreeSet::new();
        for constraint in kb.constraints() {
            if let Some(cells) = constraint.known_safe() {
                safe.extend(cells.iter().copied());
            } else if let Some(cells) = constraint.known_mines() {
                mines.extend(cells.iter().copied());
            }
        }

        kb.constraints.retain(|c| !c.is_empty());
        if safe.is_empty() && mines.is_empty() {
            return Ok(());
        }

        for cell in safe {
            kb.declare_safe(cell)?;
        }
        for cell in mines {
            kb.declare_mine(cell)?;
        }
    }
}

/// Replaces every constraint that strictly contains another by the difference of the two.
///
/// Derivations are computed against a snapshot of the store and applied afterwards;
/// replacements that collide with a live constraint are merged.
fn eliminate_subsets(kb: &mut KnowledgeBase) -> Result<()> {
    let snapshot = kb.constraints();
    let mut derived = Vec::with_capacity(snapshot.len());
    for superset in snapshot {
        let reduced = match snapshot.iter().find(|c| c.is_strict_subset_of(superset)) {
            Some(subset) => Some(superset.eliminate(subset)?),
            None => None,
        };
        derived.push(reduced);
    }

    if derived.iter().all(Option::is_none) {
        return Ok(());
    }

    let current = std::mem::take(&mut kb.constraints);
    for (constraint, reduced) in current.into_iter().zip(derived) {
        kb.insert_constraint(reduced.unwrap_or(constraint))?;
    }
    Ok(())
}
