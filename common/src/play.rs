//! The game loop: the engine picks moves, the board answers them.

use rand::Rng;

use crate::board::{Board, GameState, RevealOutcome};
use crate::config::Config;
use crate::engine::{Engine, Inference};
use crate::grid::Cell;
use crate::oracle::{self, Audit};

/// How a move was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// The cell was proven safe.
    Safe,
    /// Nothing was proven safe, so the cell was a guess.
    Random,
}

/// A single move, handed to the observer after the board and engine are updated.
#[derive(Debug)]
pub struct Turn<'a> {
    pub number: usize,
    pub cell: Cell,
    pub kind: MoveKind,
    pub outcome: RevealOutcome,
    /// What the engine proved from this reveal; `None` when a mine was hit.
    pub inference: Option<&'a Inference>,
    pub audit: Option<&'a Audit>,
    pub board: &'a Board,
    pub engine: &'a Engine,
}

/// Summary of a finished game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub state: GameState,
    pub moves: usize,
    pub safe_moves: usize,
    pub random_moves: usize,
    /// Mines the engine proved by the end of the game.
    pub mines_flagged: usize,
    /// Whether the proven mines are exactly the mines on the board.
    pub all_mines_found: bool,
    /// Forced cells the SAT audit found that subset elimination missed, summed over moves.
    pub missed_deductions: usize,
}

/// Plays one game on a fresh random board described by `config`.
pub fn play_config(config: &Config, observer: impl FnMut(&Turn)) -> anyhow::Result<Report> {
    let mut rng = config.rng();
    let mut board = Board::random(config.grid(), config.mines, &mut rng)?;
    play(&mut board, &mut rng, config.audit, observer)
}

/// Plays `board` to completion.
///
/// Each turn takes a proven-safe cell when one exists and guesses otherwise. A clear
/// reveal is reported back to the engine with its mine count.
pub fn play<R: Rng + ?Sized>(
    board: &mut Board,
    rng: &mut R,
    run_audit: bool,
    mut observer: impl FnMut(&Turn),
) -> anyhow::Result<Report> {
    let mut engine = Engine::new(board.grid());
    let mut report = Report {
        state: board.game_state(),
        moves: 0,
        safe_moves: 0,
        random_moves: 0,
        mines_flagged: 0,
        all_mines_found: false,
        missed_deductions: 0,
    };

    while board.game_state() == GameState::Playing {
        let (cell, kind) = match engine.pick_safe_move() {
            Some(cell) => (cell, MoveKind::Safe),
            None => match engine.pick_random_move(rng) {
                Some(cell) => (cell, MoveKind::Random),
                None => break,
            },
        };

        report.moves += 1;
        match kind {
            MoveKind::Safe => report.safe_moves += 1,
            MoveKind::Random => report.random_moves += 1,
        }

        let outcome = board.reveal(cell)?;
        let inference = match outcome {
            RevealOutcome::Mine => None,
            RevealOutcome::Clear(count) => Some(engine.observe(cell, count as usize)?),
        };
        let audit = match (&inference, run_audit) {
            (Some(_), true) => Some(oracle::audit(engine.knowledge())?),
            _ => None,
        };
        if let Some(audit) = &audit {
            report.missed_deductions += audit.missed_safe().len() + audit.missed_mines().len();
        }

        observer(&Turn {
            number: report.moves,
            cell,
            kind,
            outcome,
            inference: inference.as_ref(),
            audit: audit.as_ref(),
            board: &*board,
            engine: &engine,
        });
    }

    report.state = board.game_state();
    report.mines_flagged = engine.mines().len();
    report.all_mines_found = board.all_mines_found(engine.mines());
    Ok(report)
}
