//! A propositional-logic player for Minesweeper.
//!
//! Every revealed cell yields a statement "exactly `count` of these neighbors are mines".
//! The [`Engine`] keeps those statements in a [`KnowledgeBase`], strips cells as their
//! status becomes known, and reduces overlapping statements by subset elimination until
//! nothing new follows. Moves are then picked from the cells proven safe, falling back to
//! a random unexplored cell.

pub mod board;
pub mod config;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod grid;
pub mod knowledge;
pub mod moves;
pub mod oracle;
pub mod play;

pub use board::{Board, GameState, RevealOutcome, Tile};
pub use config::Config;
pub use constraint::Constraint;
pub use engine::{Engine, Inference};
pub use error::{Error, Result};
pub use grid::{Cell, Grid};
pub use knowledge::KnowledgeBase;
pub use moves::{pick_random_move, pick_safe_move};
pub use oracle::{Audit, DeducedState, audit};
pub use play::{MoveKind, Report, Turn, play, play_config};
