//! Exhaustive cross-check of the engine's knowledge with a SAT solver.
//!
//! Subset elimination is sound but incomplete: some cells are forced by the live
//! constraints taken together without any single pair exposing them. The audit
//! encodes every live constraint as an exactly-k cardinality formula and tests each
//! constrained cell both ways.
//!
//! Constraints of up to ten cells use the binomial encoding. Larger ones, which only
//! arise from [`Engine::assert_constraint`](crate::Engine::assert_constraint), go
//! through a sequential counter with auxiliary variables.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::grid::Cell;
use crate::knowledge::KnowledgeBase;

/// Largest constraint encoded clause-per-subset; above it the clause count explodes.
const NAIVE_ENCODING_LIMIT: usize = 10;

/// The possible outcomes of the solver's analysis for a single constrained cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeducedState {
    ForcedMine,   // All valid solutions require this cell to be a mine.
    ForcedSafe,   // All valid solutions require this cell to be safe.
    Undetermined, // Valid solutions exist for this cell being either a mine or safe.
}

/// Result of auditing a knowledge base.
#[derive(Debug, Clone, Default)]
pub struct Audit {
    /// Deduced state of every cell referenced by a live constraint.
    pub deductions: BTreeMap<Cell, DeducedState>,
    /// One assignment of mines to the constrained cells that satisfies every constraint.
    pub witness: BTreeMap<Cell, bool>,
}

impl Audit {
    /// Cells forced safe that the engine has not proven.
    pub fn missed_safe(&self) -> BTreeSet<Cell> {
        self.cells_in(DeducedState::ForcedSafe)
    }

    /// Cells forced to be mines that the engine has not proven.
    pub fn missed_mines(&self) -> BTreeSet<Cell> {
        self.cells_in(DeducedState::ForcedMine)
    }

    /// True when the engine already knows everything the constraints force.
    pub fn is_complete(&self) -> bool {
        self.deductions
            .values()
            .all(|&state| state == DeducedState::Undetermined)
    }

    fn cells_in(&self, wanted: DeducedState) -> BTreeSet<Cell> {
        self.deductions
            .iter()
            .filter(|&(_, &state)| state == wanted)
            .map(|(&cell, _)| cell)
            .collect()
    }
}

/// Runs the SAT audit over the live constraints of `knowledge`.
///
/// Fails when the constraints admit no assignment at all.
pub fn audit(knowledge: &KnowledgeBase) -> anyhow::Result<Audit> {
    let mut solver = Solver::new();
    let mut var_map: BTreeMap<Cell, Var> = BTreeMap::new();

    // 1. Allocate a SAT variable per constrained cell
    for constraint in knowledge.constraints() {
        for &cell in constraint.cells() {
            var_map.entry(cell).or_insert_with(|| solver.new_var());
        }
    }

    // 2. Encode every constraint as CNF
    let mut formula = CnfFormula::new();
    for constraint in knowledge.constraints() {
        let lits: Vec<Lit> = constraint
            .cells()
            .iter()
            .map(|cell| Lit::from_var(var_map[cell], true))
            .collect();
        encode_exactly_k(&mut formula, &mut solver, &lits, constraint.count());
    }
    solver.add_formula(&formula);

    // 3. The constraints must admit at least one assignment
    if !solver.solve()? {
        anyhow::bail!("live constraints are unsatisfiable");
    }
    let model = solver
        .model()
        .ok_or_else(|| anyhow::anyhow!("solver returned no model"))?;
    let witness = var_map
        .iter()
        .map(|(&cell, &var)| (cell, model.contains(&Lit::from_var(var, true))))
        .collect();

    // 4. Test each cell both ways
    let mut deductions = BTreeMap::new();
    for (&cell, &var) in &var_map {
        let mine = Lit::from_var(var, true);
        let mine_possible = satisfiable_with(&mut solver, mine)?;
        let safe_possible = satisfiable_with(&mut solver, !mine)?;

        let state = match (mine_possible, safe_possible) {
            (true, true) => DeducedState::Undetermined,
            (true, false) => DeducedState::ForcedMine,
            (false, true) => DeducedState::ForcedSafe,
            (false, false) => anyhow::bail!("no assignment exists for {cell}"),
        };
        deductions.insert(cell, state);
    }

    Ok(Audit {
        deductions,
        witness,
    })
}

fn satisfiable_with(solver: &mut Solver, lit: Lit) -> anyhow::Result<bool> {
    solver.assume(&[lit]);
    let result = solver.solve();
    solver.assume(&[]);
    Ok(result?)
}

/// Encodes "exactly k of `lits` are true" as at-most-k plus at-least-k.
fn encode_exactly_k(formula: &mut CnfFormula, solver: &mut Solver, lits: &[Lit], k: usize) {
    encode_at_most_k(formula, solver, lits, k);
    encode_at_least_k(formula, solver, lits, k);
}

fn encode_at_most_k(formula: &mut CnfFormula, solver: &mut Solver, lits: &[Lit], k: usize) {
    if k >= lits.len() {
        return;
    }
    if k == 0 {
        for &lit in lits {
            formula.add_clause(&[!lit]);
        }
        return;
    }

    if lits.len() <= NAIVE_ENCODING_LIMIT {
        // Every k+1 subset has a false literal
        for combo in lits.iter().combinations(k + 1) {
            let clause: Vec<Lit> = combo.into_iter().map(|&lit| !lit).collect();
            formula.add_clause(&clause);
        }
    } else {
        encode_sequential_counter_at_most_k(formula, solver, lits, k);
    }
}

fn encode_at_least_k(formula: &mut CnfFormula, solver: &mut Solver, lits: &[Lit], k: usize) {
    if k == 0 {
        return;
    }
    if k > lits.len() {
        formula.add_clause(&[]);
        return;
    }

    if lits.len() <= NAIVE_ENCODING_LIMIT {
        // Every n-k+1 subset has a true literal
        for combo in lits.iter().copied().combinations(lits.len() - k + 1) {
            formula.add_clause(&combo);
        }
    } else {
        // At least k true is at most n-k false.
        let negated: Vec<Lit> = lits.iter().map(|&lit| !lit).collect();
        encode_at_most_k(formula, solver, &negated, lits.len() - k);
    }
}

/// Sequential counter encoding of "at most k of `lits` are true", for `0 < k < n`.
///
/// `s[i][j]` is forced true whenever at least `j + 1` of `lits[..=i]` are true, and no
/// literal may push a prefix past `k`.
fn encode_sequential_counter_at_most_k(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    lits: &[Lit],
    k: usize,
) {
    let n = lits.len();
    let s: Vec<Vec<Lit>> = (0..n - 1)
        .map(|_| (0..k).map(|_| solver.new_lit()).collect())
        .collect();

    // First literal: counts as one, nothing higher yet
    formula.add_clause(&[!lits[0], s[0][0]]);
    for &higher in &s[0][1..] {
        formula.add_clause(&[!higher]);
    }

    for i in 1..n - 1 {
        formula.add_clause(&[!lits[i], s[i][0]]);
        formula.add_clause(&[!s[i - 1][0], s[i][0]]);
        for j in 1..k {
            formula.add_clause(&[!lits[i], !s[i - 1][j - 1], s[i][j]]);
            formula.add_clause(&[!s[i - 1][j], s[i][j]]);
        }
        formula.add_clause(&[!lits[i], !s[i - 1][k - 1]]);
    }

    formula.add_clause(&[!lits[n - 1], !s[n - 2][k - 1]]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Constraint;
    use crate::engine::Engine;
    use crate::grid::Grid;

    fn constraint(coords: &[(usize, usize)], count: usize) -> Constraint {
        Constraint::new(coords.iter().copied().map(Cell::from), count).unwrap()
    }

    fn knowledge(constraints: Vec<Constraint>) -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        for constraint in constraints {
            kb.insert_constraint(constraint).unwrap();
        }
        kb
    }

    #[test]
    fn test_symmetric_constraint_is_undetermined() {
        let kb = knowledge(vec![constraint(&[(0, 0), (0, 1)], 1)]);
        let audit = audit(&kb).unwrap();

        assert!(audit.is_complete());
        assert_eq!(
            audit.deductions.get(&Cell::new(0, 0)),
            Some(&DeducedState::Undetermined)
        );

        // The witness must satisfy the constraint (exactly 1 mine)
        let mine_count = audit.witness.values().filter(|&&is_mine| is_mine).count();
        assert_eq!(mine_count, 1);
    }

    #[test]
    fn test_finds_deductions_subset_elimination_misses() {
        // No constraint is trivial and none contains another, yet together they force
        // every cell: a + b = 1, a + c = 1, b + c + d = 2  =>  a = d = 0, b = c = 1
        let kb = knowledge(vec![
            constraint(&[(0, 0), (0, 1)], 1),
            constraint(&[(0, 0), (1, 0)], 1),
            constraint(&[(0, 1), (1, 0), (1, 1)], 2),
        ]);
        let audit = audit(&kb).unwrap();

        assert_eq!(
            audit.missed_mines(),
            BTreeSet::from([Cell::new(0, 1), Cell::new(1, 0)])
        );
        assert_eq!(
            audit.missed_safe(),
            BTreeSet::from([Cell::new(0, 0), Cell::new(1, 1)])
        );
        assert!(!audit.is_complete());
    }

    #[test]
    fn test_audits_constraints_larger_than_a_neighborhood() {
        let mut engine = Engine::new(Grid::new(4, 4));
        let cells: Vec<Cell> = engine.grid().cells().take(13).collect();
        engine
            .assert_constraint(Constraint::new(cells.iter().copied(), 3).unwrap())
            .unwrap();

        let audit = audit(engine.knowledge()).unwrap();
        assert!(audit.is_complete());
        assert_eq!(audit.deductions.len(), 13);
        assert!(
            audit
                .deductions
                .values()
                .all(|state| *state == DeducedState::Undetermined)
        );
        let mines = cells.iter().filter(|c| audit.witness[*c]).count();
        assert_eq!(mines, 3);
    }

    #[test]
    fn test_large_constraint_forces_cells_outside_a_subset() {
        // One mine among eleven cells, and it is one of the first two
        let row: Vec<(usize, usize)> = (0..11).map(|col| (0, col)).collect();
        let kb = knowledge(vec![
            constraint(&row, 1),
            constraint(&[(0, 0), (0, 1)], 1),
        ]);
        let audit = audit(&kb).unwrap();

        assert_eq!(
            audit.missed_safe(),
            (2..11).map(|col| Cell::new(0, col)).collect::<BTreeSet<_>>()
        );
        assert!(audit.missed_mines().is_empty());
        assert_eq!(
            audit.deductions[&Cell::new(0, 0)],
            DeducedState::Undetermined
        );
        assert_eq!(
            audit.deductions[&Cell::new(0, 1)],
            DeducedState::Undetermined
        );
    }

    #[test]
    fn test_large_constraint_with_every_cell_a_mine() {
        let row: Vec<(usize, usize)> = (0..12).map(|col| (1, col)).collect();
        let audit = audit(&knowledge(vec![constraint(&row, 12)])).unwrap();

        assert_eq!(audit.missed_mines().len(), 12);
        assert!(audit.witness.values().all(|&is_mine| is_mine));
    }

    #[test]
    fn test_unsatisfiable_constraints_fail() {
        // a + b = 1, b + c = 0, a + c = 0
        let kb = knowledge(vec![
            constraint(&[(0, 0), (0, 1)], 1),
            constraint(&[(0, 1), (0, 2)], 0),
            constraint(&[(0, 0), (0, 2)], 0),
        ]);
        assert!(audit(&kb).is_err());
    }

    #[test]
    fn test_empty_knowledge_is_complete() {
        let audit = audit(&KnowledgeBase::new()).unwrap();
        assert!(audit.deductions.is_empty());
        assert!(audit.is_complete());
    }
}
