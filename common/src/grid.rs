use std::fmt;

/// A coordinate on the board, addressed by row then column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

/// The dimensions of a `height x width` board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Grid {
    pub height: usize,
    pub width: usize,
}

impl Grid {
    pub const fn new(height: usize, width: usize) -> Self {
        Grid { height, width }
    }

    /// Total number of cells on the board.
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// Every cell of the board in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |col| Cell { row, col }))
    }

    /// All in-bounds cells adjacent to `cell`, diagonals included.
    /// Board edges and corners clip the neighborhood; the cell itself is never yielded.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + use<> {
        let height = self.height;
        let width = self.width;

        (-1..=1).flat_map(move |dr: isize| {
            (-1..=1).filter_map(move |dc: isize| {
                if dr == 0 && dc == 0 {
                    return None;
                }

                let row = cell.row as isize + dr;
                let col = cell.col as isize + dc;

                if row >= 0 && row < height as isize && col >= 0 && col < width as isize {
                    Some(Cell {
                        row: row as usize,
                        col: col as usize,
                    })
                } else {
                    None
                }
            })
        })
    }
}
