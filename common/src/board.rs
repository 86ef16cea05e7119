use std::collections::{BTreeSet, HashSet};
use std::fmt;

use rand::Rng;

use crate::error::{Error, Result};
use crate::grid::{Cell, Grid};

/// The visible state of a single cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Tile {
    Hidden,
    Revealed(u8), // The u8 is the number of adjacent mines.
}

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// What a single reveal uncovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Mine,
    Clear(u8),
}

/// A Minesweeper board with a fixed mine layout.
///
/// This is the ground truth the player queries; the player's own knowledge lives in
/// [`crate::KnowledgeBase`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Board {
    grid: Grid,
    mines: BTreeSet<Cell>,
    /// The visible state of the board, indexed by row then column.
    tiles: Vec<Vec<Tile>>,
    game_state: GameState,
}

impl Board {
    /// Places `mines` mines uniformly at random.
    pub fn random<R: Rng + ?Sized>(grid: Grid, mines: usize, rng: &mut R) -> Result<Self> {
        check_layout(grid, mines)?;
        let width = grid.width;
        let layout = rand::seq::index::sample(rng, grid.len(), mines)
            .into_iter()
            .map(|i| Cell::new(i / width, i % width));
        Board::with_mines(grid, layout)
    }

    /// Builds a board with a fixed mine layout.
    pub fn with_mines(grid: Grid, mines: impl IntoIterator<Item = Cell>) -> Result<Self> {
        let board = Board {
            grid,
            mines: mines.into_iter().collect(),
            tiles: vec![vec![Tile::Hidden; grid.width]; grid.height],
            game_state: GameState::Playing,
        };
        board.check()?;
        Ok(board)
    }

    /// Deserializes a board from bytes, rejecting tiles or mines that do not fit its grid.
    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        let board: Board = bcs::from_bytes(bts)?;
        board.check()?;
        Ok(board)
    }

    /// Serializes the board to bytes.
    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn mine_count(&self) -> usize {
        self.mines.len()
    }

    pub fn game_state(&self) -> GameState {
        self.game_state
    }

    /// The visible tile at `cell`, or `None` off the board.
    pub fn tile(&self, cell: Cell) -> Option<Tile> {
        self.tiles.get(cell.row)?.get(cell.col).copied()
    }

    pub fn tiles(&self) -> &[Vec<Tile>] {
        &self.tiles
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    /// Number of mines among the cells adjacent to `cell`, not counting the cell itself.
    pub fn nearby_mines(&self, cell: Cell) -> u8 {
        self.grid
            .neighbors(cell)
            .filter(|n| self.mines.contains(n))
            .count() as u8
    }

    /// True when `found` flags exactly the mines on the board.
    pub fn all_mines_found(&self, found: &HashSet<Cell>) -> bool {
        found.len() == self.mines.len() && found.iter().all(|c| self.mines.contains(c))
    }

    /// Reveals a hidden cell.
    ///
    /// Hitting a mine loses the game. The game is won once every cell without a mine
    /// has been revealed.
    pub fn reveal(&mut self, cell: Cell) -> Result<RevealOutcome> {
        if !self.grid.contains(cell) {
            return Err(Error::invalid_move(cell, "outside the board"));
        }
        if self.game_state != GameState::Playing {
            return Err(Error::invalid_move(cell, "game has ended"));
        }
        if self.tile(cell) != Some(Tile::Hidden) {
            return Err(Error::invalid_move(cell, "already revealed"));
        }

        if self.is_mine(cell) {
            self.game_state = GameState::Lost;
            return Ok(RevealOutcome::Mine);
        }

        let count = self.nearby_mines(cell);
        self.tiles[cell.row][cell.col] = Tile::Revealed(count);

        if self.hidden_count() == self.mines.len() {
            self.game_state = GameState::Won;
        }
        Ok(RevealOutcome::Clear(count))
    }

    fn check(&self) -> Result<()> {
        let (height, width) = (self.grid.height, self.grid.width);
        if let Some(&cell) = self.mines.iter().find(|c| !self.grid.contains(**c)) {
            return Err(Error::InvalidConfiguration {
                message: format!("mine at {cell} is outside a {height}x{width} board"),
            });
        }
        check_layout(self.grid, self.mines.len())?;
        if self.tiles.len() != height || self.tiles.iter().any(|row| row.len() != width) {
            return Err(Error::InvalidConfiguration {
                message: format!("tiles do not match a {height}x{width} board"),
            });
        }
        Ok(())
    }

    fn hidden_count(&self) -> usize {
        self.tiles
            .iter()
            .flatten()
            .filter(|t| matches!(t, Tile::Hidden))
            .count()
    }
}

fn check_layout(grid: Grid, mines: usize) -> Result<()> {
    if grid.is_empty() {
        return Err(Error::InvalidConfiguration {
            message: "board must have at least one cell".to_string(),
        });
    }
    if mines >= grid.len() {
        return Err(Error::InvalidConfiguration {
            message: format!(
                "{mines} mines do not fit on a {}x{} board",
                grid.height, grid.width
            ),
        });
    }
    Ok(())
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Print header
        write!(f, "   ")?;
        for col in 0..self.grid.width {
            write!(f, "{:^3}", col)?;
        }
        writeln!(f, "\n  +{}", "---".repeat(self.grid.width))?;

        // Print rows; mines are only shown once the game is lost.
        for (row, tiles) in self.tiles.iter().enumerate() {
            write!(f, "{:^2}|", row)?;
            for (col, tile) in tiles.iter().enumerate() {
                match tile {
                    Tile::Hidden
                        if self.game_state == GameState::Lost
                            && self.is_mine(Cell::new(row, col)) =>
                    {
                        write!(f, " X ")?
                    }
                    Tile::Hidden => write!(f, " ■ ")?,
                    Tile::Revealed(n) => write!(f, " {} ", n)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_board_places_exact_mine_count() {
        let mut rng = StdRng::seed_from_u64(42);
        let board = Board::random(Grid::new(8, 8), 8, &mut rng).unwrap();
        assert_eq!(board.mine_count(), 8);
        assert_eq!(board.game_state(), GameState::Playing);

        // Verify all cells start as hidden
        for row in board.tiles() {
            for tile in row {
                assert_eq!(*tile, Tile::Hidden);
            }
        }
    }

    #[test]
    fn test_too_many_mines_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = Board::random(Grid::new(3, 3), 9, &mut rng).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));

        let err = Board::with_mines(Grid::new(3, 3), [Cell::new(3, 3)]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_nearby_mines() {
        let board = Board::with_mines(
            Grid::new(3, 3),
            [Cell::new(0, 0), Cell::new(2, 2), Cell::new(0, 2)],
        )
        .unwrap();
        assert_eq!(board.nearby_mines(Cell::new(1, 1)), 3);
        assert_eq!(board.nearby_mines(Cell::new(0, 1)), 2);
        assert_eq!(board.nearby_mines(Cell::new(2, 0)), 0);
        // A mine does not count itself
        assert_eq!(board.nearby_mines(Cell::new(0, 0)), 0);
    }

    #[test]
    fn test_hitting_mine_loses() {
        let mut board = Board::with_mines(Grid::new(2, 2), [Cell::new(0, 0)]).unwrap();
        assert_eq!(board.reveal(Cell::new(0, 0)).unwrap(), RevealOutcome::Mine);
        assert_eq!(board.game_state(), GameState::Lost);
        assert!(board.reveal(Cell::new(1, 1)).is_err());
    }

    #[test]
    fn test_revealing_every_clear_cell_wins() {
        let mut board = Board::with_mines(Grid::new(2, 2), [Cell::new(0, 0)]).unwrap();
        for cell in [Cell::new(0, 1), Cell::new(1, 0), Cell::new(1, 1)] {
            assert_eq!(board.reveal(cell).unwrap(), RevealOutcome::Clear(1));
        }
        assert_eq!(board.game_state(), GameState::Won);
    }

    #[test]
    fn test_reveal_twice_is_rejected() {
        let mut board = Board::with_mines(Grid::new(2, 2), [Cell::new(0, 0)]).unwrap();
        board.reveal(Cell::new(1, 1)).unwrap();
        assert!(matches!(
            board.reveal(Cell::new(1, 1)),
            Err(Error::InvalidMove { .. })
        ));
    }

    #[test]
    fn test_all_mines_found() {
        let board = Board::with_mines(Grid::new(3, 3), [Cell::new(0, 0), Cell::new(1, 2)]).unwrap();
        let mut found = HashSet::from([Cell::new(0, 0)]);
        assert!(!board.all_mines_found(&found));
        found.insert(Cell::new(1, 2));
        assert!(board.all_mines_found(&found));
    }

    #[test]
    fn test_serialization_preserves_board() {
        let mut board = Board::with_mines(Grid::new(4, 3), [Cell::new(2, 1)]).unwrap();
        board.reveal(Cell::new(0, 0)).unwrap();

        let bytes = board.serialize().unwrap();
        let restored = Board::deserialize(&bytes).unwrap();
        assert_eq!(restored, board);
        assert_eq!(restored.tile(Cell::new(0, 0)), Some(Tile::Revealed(0)));
        assert_eq!(restored.tile(Cell::new(1, 0)), Some(Tile::Hidden));
    }

    #[test]
    fn test_tile_off_the_board_is_none() {
        let board = Board::with_mines(Grid::new(2, 3), [Cell::new(1, 1)]).unwrap();
        assert_eq!(board.tile(Cell::new(2, 0)), None);
        assert_eq!(board.tile(Cell::new(0, 3)), None);
    }

    #[test]
    fn test_deserialize_rejects_malformed_boards() {
        let valid = Board::with_mines(Grid::new(3, 3), [Cell::new(0, 0)]).unwrap();

        // Rows narrower than the grid
        let narrow = Board {
            tiles: vec![vec![Tile::Hidden; 2]; 3],
            ..valid.clone()
        };
        assert!(Board::deserialize(&narrow.serialize().unwrap()).is_err());

        // A row missing
        let short = Board {
            tiles: vec![vec![Tile::Hidden; 3]; 2],
            ..valid.clone()
        };
        assert!(Board::deserialize(&short.serialize().unwrap()).is_err());

        // A mine off the board
        let stray = Board {
            mines: BTreeSet::from([Cell::new(5, 5)]),
            ..valid.clone()
        };
        assert!(Board::deserialize(&stray.serialize().unwrap()).is_err());

        assert_eq!(
            Board::deserialize(&valid.serialize().unwrap()).unwrap(),
            valid
        );
    }
}
