use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Simple, file-backed sprint board CLI.
/// Storage defaults to ~/.sl/board.json or a path passed via --board.
#[derive(Parser)]
#[command(name = "sl", version, about = "Sprint ledger and burndown CLI")]
pub struct Cli {
    /// Path to the JSON board file.
    #[arg(long, global = true)]
    pub board: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
