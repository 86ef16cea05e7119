//! Error types for the inference engine and board.

use thiserror::Error;

use crate::grid::Cell;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid move at {cell}: {reason}")]
    InvalidMove { cell: Cell, reason: String },

    #[error("contradiction over {cells:?} with count {count}: {reason}")]
    ContradictionDetected {
        cells: Vec<Cell>,
        count: usize,
        reason: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_move(cell: Cell, reason: impl Into<String>) -> Self {
        Error::InvalidMove {
            cell,
            reason: reason.into(),
        }
    }

    pub(crate) fn contradiction<'a>(
        cells: impl IntoIterator<Item = &'a Cell>,
        count: usize,
        reason: impl Into<String>,
    ) -> Self {
        Error::ContradictionDetected {
            cells: cells.into_iter().copied().collect(),
            count,
            reason: reason.into(),
        }
    }
}
