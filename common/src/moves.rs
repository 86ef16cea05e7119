use rand::Rng;
use rand::prelude::IndexedRandom;

use crate::grid::{Cell, Grid};
use crate::knowledge::KnowledgeBase;

/// A cell proven safe that has not been played yet.
///
/// The lowest such cell is returned so that play is deterministic. The caller owns
/// the move from here on and must report it back through `observe`.
pub fn pick_safe_move(knowledge: &KnowledgeBase) -> Option<Cell> {
    knowledge
        .safe()
        .difference(knowledge.moves_made())
        .min()
        .copied()
}

/// A uniformly random cell that is neither played nor a known mine.
/// Returns `None` once every such cell is exhausted.
pub fn pick_random_move<R: Rng + ?Sized>(
    knowledge: &KnowledgeBase,
    grid: Grid,
    rng: &mut R,
) -> Option<Cell> {
    let candidates: Vec<Cell> = grid
        .cells()
        .filter(|cell| {
            !knowledge.moves_made().contains(cell) && !knowledge.mines().contains(cell)
        })
        .collect();

    candidates.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_safe_move_is_consumed_once_played() {
        let mut kb = KnowledgeBase::new();
        kb.declare_safe(Cell::new(1, 1)).unwrap();

        assert_eq!(pick_safe_move(&kb), Some(Cell::new(1, 1)));

        kb.record_move(Cell::new(1, 1));
        assert_eq!(pick_safe_move(&kb), None);
    }

    #[test]
    fn test_safe_move_prefers_lowest_cell() {
        let mut kb = KnowledgeBase::new();
        kb.declare_safe(Cell::new(2, 0)).unwrap();
        kb.declare_safe(Cell::new(0, 2)).unwrap();
        assert_eq!(pick_safe_move(&kb), Some(Cell::new(0, 2)));
    }

    #[test]
    fn test_random_move_avoids_played_cells_and_mines() {
        let grid = Grid::new(2, 2);
        let mut kb = KnowledgeBase::new();
        kb.record_move(Cell::new(0, 0));
        kb.declare_mine(Cell::new(0, 1)).unwrap();
        kb.declare_mine(Cell::new(1, 0)).unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(pick_random_move(&kb, grid, &mut rng), Some(Cell::new(1, 1)));
        }

        kb.record_move(Cell::new(1, 1));
        assert_eq!(pick_random_move(&kb, grid, &mut rng), None);
    }
}
