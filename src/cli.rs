use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Daily task planner that tracks estimated versus actual time.
/// Storage defaults to ~/.timebox/tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tb", version, about = "Plan your day and learn how well you estimate")]
pub struct Cli {
    /// Path to the JSON task store.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Act as this user instead of the configured one.
    #[arg(long, global = true, env = "TIMEBOX_USER")]
    pub user: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}
