//! Configuration for autonomous play.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::grid::Grid;

/// Configuration for a game played by the bot.
///
/// # Examples
///
/// ```
/// use minesweeper_ai::Config;
///
/// let config = Config::default()
///     .with_size(16, 16)
///     .with_mines(40)
///     .with_seed(42);
/// assert_eq!(config.grid().len(), 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Board height in rows
    pub height: usize,
    /// Board width in columns
    pub width: usize,
    /// Number of mines placed on the board
    pub mines: usize,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
    /// Cross-check the engine with the SAT audit after every move
    pub audit: bool,
}

impl Config {
    /// Set the board dimensions.
    pub fn with_size(mut self, height: usize, width: usize) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    pub fn with_mines(mut self, mines: usize) -> Self {
        self.mines = mines;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_audit(mut self, audit: bool) -> Self {
        self.audit = audit;
        self
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.height, self.width)
    }

    /// A seeded generator when a seed is set, otherwise one seeded from the OS.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

impl Default for Config {
    /// An 8x8 board with 8 mines.
    fn default() -> Self {
        Self {
            height: 8,
            width: 8,
            mines: 8,
            seed: None,
            audit: false,
        }
    }
}
