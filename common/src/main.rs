use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use minesweeper_ai::*;

#[derive(Parser)]
#[command(name = "bot")]
#[command(version, about = "Autonomous Minesweeper bot driven by logical inference", long_about = None)]
struct Cli {
    /// Board height in rows
    #[arg(long, default_value_t = 8)]
    height: usize,

    /// Board width in columns
    #[arg(long, default_value_t = 8)]
    width: usize,

    /// Number of mines
    #[arg(long, default_value_t = 8)]
    mines: usize,

    /// Random seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,

    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    games: u64,

    /// Cross-check every move with the SAT audit
    #[arg(long)]
    audit: bool,

    /// Only print the final summary
    #[arg(long)]
    quiet: bool,

    /// Delay between moves in milliseconds, to make a single game watchable
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let base = Config::default()
        .with_size(cli.height, cli.width)
        .with_mines(cli.mines)
        .with_audit(cli.audit);

    if !cli.quiet {
        println!("--- Autonomous Minesweeper Bot ---");
        println!("Strategy: Play cells proven safe, guess randomly otherwise.");
    }

    let mut wins = 0;
    let mut losses = 0;
    let mut missed = 0;
    for game in 0..cli.games {
        // Each game gets its own seed so a run of games is reproducible as a whole.
        let config = match cli.seed {
            Some(seed) => base.clone().with_seed(seed.wrapping_add(game)),
            None => base.clone(),
        };

        if !cli.quiet {
            println!("\n=== Game #{} ===", game + 1);
        }
        let report = play_config(&config, |turn| {
            if !cli.quiet {
                print_turn(turn);
            }
            if cli.delay_ms > 0 {
                thread::sleep(Duration::from_millis(cli.delay_ms));
            }
        })?;

        match report.state {
            GameState::Won => wins += 1,
            GameState::Lost => losses += 1,
            GameState::Playing => {}
        }
        missed += report.missed_deductions;

        if !cli.quiet {
            print_report(&report);
        }
    }

    println!("\n--- Summary ---");
    println!(
        "Played {} games on {}x{} with {} mines: {} won, {} lost ({:.1}% win rate).",
        cli.games,
        cli.height,
        cli.width,
        cli.mines,
        wins,
        losses,
        100.0 * wins as f64 / cli.games.max(1) as f64
    );
    if cli.audit {
        println!("SAT audit found {} forced cells subset elimination missed.", missed);
    }
    Ok(())
}

fn print_turn(turn: &Turn) {
    let how = match turn.kind {
        MoveKind::Safe => "safe",
        MoveKind::Random => "random",
    };
    println!("\n--- Move #{} ---", turn.number);
    match turn.outcome {
        RevealOutcome::Mine => println!("Bot reveals {} ({} move)... it was a mine.", turn.cell, how),
        RevealOutcome::Clear(n) => println!("Bot reveals {} ({} move): {} nearby.", turn.cell, how, n),
    }
    if let Some(inference) = turn.inference.filter(|i| !i.is_empty()) {
        println!(
            "Inferred {} safe and {} mine cells ({} constraints live).",
            inference.safe.len(),
            inference.mines.len(),
            turn.engine.knowledge().constraints().len()
        );
    }
    if let Some(audit) = turn.audit.filter(|a| !a.is_complete()) {
        println!(
            "Audit: {} safe and {} mine cells are forced but not yet derived.",
            audit.missed_safe().len(),
            audit.missed_mines().len()
        );
    }
    print!("{}", turn.board);
}

fn print_report(report: &Report) {
    match report.state {
        GameState::Won => println!("Result: The bot won!"),
        GameState::Lost => println!("Result: The bot hit a mine and lost."),
        GameState::Playing => println!("Result: The game ended unexpectedly."),
    }
    println!(
        "{} moves ({} safe, {} random), {} mines flagged{}.",
        report.moves,
        report.safe_moves,
        report.random_moves,
        report.mines_flagged,
        if report.all_mines_found {
            ", all mines found"
        } else {
            ""
        }
    );
}
