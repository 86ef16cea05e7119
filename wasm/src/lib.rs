use minesweeper_ai as ms;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn create_board(height: u8, width: u8, mines: u8) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let grid = ms::Grid::new(height as usize, width as usize);
    let board =
        ms::Board::random(grid, mines as usize, &mut rand::rng()).map_err(|e| e.to_string())?;
    board.serialize().map_err(|e| e.to_string())
}

/// Reveals a cell. The returned board bytes carry one extra trailing byte: 1 if a mine was hit.
#[wasm_bindgen]
pub fn reveal(bts: Vec<u8>, row: usize, col: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut board = ms::Board::deserialize(&bts).map_err(|e| e.to_string())?;
    let outcome = board
        .reveal(ms::Cell::new(row, col))
        .map_err(|e| e.to_string())?;
    let mut xs = board.serialize().map_err(|e| e.to_string())?;
    xs.push(if outcome == ms::RevealOutcome::Mine { 1 } else { 0 });
    Ok(xs)
}

#[wasm_bindgen]
pub fn get_tiles(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let board = ms::Board::deserialize(&bts).map_err(|e| e.to_string())?;
    Ok(board
        .tiles()
        .iter()
        .flat_map(|row| {
            row.iter().map(|tile| match tile {
                ms::Tile::Hidden => -1,
                ms::Tile::Revealed(n) => *n as i8,
            })
        })
        .collect())
}

/// A cell proven safe from the visible tiles, as `[row, col]`, or empty when none is known.
/// The engine is rebuilt from the board on every call.
#[wasm_bindgen]
pub fn hint(bts: Vec<u8>) -> Result<Vec<u32>, String> {
    console_error_panic_hook::set_once();

    let board = ms::Board::deserialize(&bts).map_err(|e| e.to_string())?;
    let engine = ms::Engine::from_board(&board).map_err(|e| e.to_string())?;
    Ok(engine
        .pick_safe_move()
        .map(|cell| vec![cell.row as u32, cell.col as u32])
        .unwrap_or_default())
}
