//! # sl - Sprint Ledger CLI
//!
//! A command-line sprint board built around a daily re-estimation ledger.
//! Each task carries one remaining-hours slot per sprint day; a day's write
//! replicates forward until the next write, and a zero marks the task burned
//! down from that day on. On top of the ledger sit:
//!
//! - **Burndown projection**: ideal, actual, and velocity-projected
//!   remaining-work lines for a sprint, computed in exactly one place.
//! - **WIP limits**: optional per-status caps on the Prioritized and Doing
//!   columns, advisory until enforcement is switched on.
//! - **Time validation**: a task reaches Done only with a validated
//!   time-spent figure; estimation errors past 20% require a written reason.
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task with an 8-hour baseline
//! sl add "Implement login" --estimate 8 --sprint 2026-s3
//!
//! # Day 4 stand-up: 6 hours left
//! sl estimate 1 4 6
//!
//! # Move it across the board
//! sl move 1 doing
//!
//! # Finish it (reason required past a 20% overrun)
//! sl complete 1 --time-spent 9
//!
//! # Project the sprint
//! sl burndown --sprint 2026-s3
//! ```
//!
//! Data is stored locally in `~/.sl/board.json` (override with `--board`).

use std::path::PathBuf;

use clap::Parser;

pub mod burndown;
pub mod cli;
pub mod cmd;
pub mod db;
pub mod error;
pub mod fields;
pub mod gates;
pub mod ledger;
pub mod task;

use cli::Cli;
use cmd::*;
use db::Board;

fn main() {
    let cli = Cli::parse();

    // Completions need no board file.
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let board_path = cli.board.unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let sl_dir = PathBuf::from(home).join(".sl");
        if let Err(e) = std::fs::create_dir_all(&sl_dir) {
            eprintln!("Failed to create data directory {}: {}", sl_dir.display(), e);
            std::process::exit(1);
        }
        sl_dir.join("board.json")
    });

    let mut board = Board::load(&board_path);

    match cli.command {
        Commands::Add { title, estimate, sprint } => {
            cmd_add(&mut board, &board_path, title, estimate, sprint)
        }

        Commands::List { all, status, sprint, day } => cmd_list(&board, all, status, sprint, day),

        Commands::View { id } => cmd_view(&board, id),

        Commands::Estimate { id, day, value } => {
            cmd_estimate(&mut board, &board_path, id, day, value)
        }

        Commands::Move { id, status, forward, back, actor } => {
            cmd_move(&mut board, &board_path, id, status, forward, back, actor)
        }

        Commands::Complete { id, time_spent, reason, actor } => {
            cmd_complete(&mut board, &board_path, id, time_spent, reason, actor)
        }

        Commands::Reopen { id, actor } => cmd_reopen(&mut board, &board_path, id, actor),

        Commands::Burndown { sprint, day } => cmd_burndown(&board, sprint, day),

        Commands::Wip { action } => cmd_wip(&mut board, &board_path, action),

        Commands::Capacity { developers, hours_per_day, sprint_days } => {
            cmd_capacity(&mut board, &board_path, developers, hours_per_day, sprint_days)
        }

        Commands::Delete { id } => cmd_delete(&mut board, &board_path, id),

        Commands::Completions { .. } => unreachable!("completions handled above"),
    }
}
