use std::thread;
use std::time::Duration;

use clap::Parser;
use minesweeper_inference::{Game, GameState, Move, Tile};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Autonomous minesweeper bot: reveals cells it can prove safe and guesses
/// only when it has to.
#[derive(Parser, Debug)]
#[command(name = "minesweeper-bot", version, about)]
struct Cli {
    /// Number of rows.
    #[arg(long, default_value_t = 8)]
    height: usize,

    /// Number of columns.
    #[arg(long, default_value_t = 8)]
    width: usize,

    /// Number of mines on the board.
    #[arg(long, default_value_t = 8)]
    mines: usize,

    /// Seed for mine placement and guesses. Random if omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Pause between moves, in milliseconds.
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // --- 1. Initialization ---
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut game = Game::new(cli.height, cli.width, cli.mines, &mut rng)?;
    let delay = Duration::from_millis(cli.delay_ms);

    println!("--- Autonomous Minesweeper Bot ---");
    println!("Strategy: reveal cells proven safe, guess randomly otherwise.");
    log::debug!("mine layout:\n{}", game.board());
    print_board(&game);

    // --- 2. Game Loop ---
    let mut move_count = 0;
    let mut guesses = 0;
    while game.game_state == GameState::Playing {
        move_count += 1;
        println!("\n--- Move #{move_count} ---");

        match game.step(&mut rng)? {
            Some(Move::Certain(cell)) => println!("Bot reveals {cell} (proven safe)"),
            Some(Move::Guess(cell)) => {
                guesses += 1;
                println!("Bot guesses {cell}");
            }
            None => {
                println!("No valid moves left for the bot to make.");
                break;
            }
        }
        print_board(&game);
        thread::sleep(delay);
    }

    // --- 3. Final Result ---
    println!("\n--- Game Over ---");
    println!("Moves: {move_count}, guesses: {guesses}");
    match game.game_state {
        GameState::Won => println!("Result: The bot won!"),
        GameState::Lost => println!("Result: The bot hit a mine and lost."),
        GameState::Playing => println!("Result: The game ended unexpectedly."),
    }
    Ok(())
}

fn print_board(game: &Game) {
    // Print header
    print!("   ");
    for col in 0..game.width() {
        print!("{col:^3}");
    }
    println!("\n  +{}", "---".repeat(game.width()));

    // Print rows
    for (row, tiles) in game.tiles().iter().enumerate() {
        print!("{row:^2}|");
        for tile in tiles {
            let display = match tile {
                Tile::Hidden => " ■ ".to_string(),
                Tile::Flagged => " F ".to_string(),
                Tile::Revealed(n) => format!(" {n} "),
            };
            print!("{display}");
        }
        println!();
    }
    println!();
}
