use minesweeper_inference as ms;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn create_game(height: u8, width: u8, mines: u16) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut rng = rand::rng();
    let game = ms::Game::new(height as usize, width as usize, mines as usize, &mut rng)
        .map_err(|e| e.to_string())?;
    game.serialize().map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn validate(bts: Vec<u8>) -> Result<bool, String> {
    console_error_panic_hook::set_once();

    let game = ms::Game::deserialize(&bts).map_err(|e| e.to_string())?;
    Ok(game.game_state == ms::GameState::Won)
}

/// Reveals a player-chosen cell. The trailing byte is 1 if it was a mine.
#[wasm_bindgen]
pub fn choose_cell(bts: Vec<u8>, row: usize, col: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = ms::Game::deserialize(&bts).map_err(|e| e.to_string())?;
    let res = game
        .reveal(ms::Cell::new(row, col))
        .map_err(|e| e.to_string())?;
    let mut xs = game.serialize().map_err(|e| e.to_string())?;
    xs.push(if res { 0 } else { 1 });
    Ok(xs)
}

/// Lets the bot play one move. The trailing byte is 0 for a proven-safe
/// move, 1 for a guess and 2 if no move was left.
#[wasm_bindgen]
pub fn bot_step(bts: Vec<u8>) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = ms::Game::deserialize(&bts).map_err(|e| e.to_string())?;
    let mut rng = rand::rng();
    let next = game.step(&mut rng).map_err(|e| e.to_string())?;
    let mut xs = game.serialize().map_err(|e| e.to_string())?;
    xs.push(match next {
        Some(ms::Move::Certain(_)) => 0,
        Some(ms::Move::Guess(_)) => 1,
        None => 2,
    });
    Ok(xs)
}

/// Row-major tiles: -1 hidden, -2 flagged, otherwise the revealed count.
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let game = ms::Game::deserialize(&bts).map_err(|e| e.to_string())?;
    Ok(game
        .tiles()
        .into_iter()
        .flat_map(|row| {
            row.into_iter().map(|tile| match tile {
                ms::Tile::Hidden => -1,
                ms::Tile::Flagged => -2,
                ms::Tile::Revealed(n) => n as i8,
            })
        })
        .collect())
}
