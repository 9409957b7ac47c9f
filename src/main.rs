//! `tb` - plan your day and learn how well you estimate.
//!
//! See the library documentation for an overview of the commands.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use timebox::cli::Cli;
use timebox::cmd::*;
use timebox::config::{self, Config};
use timebox::db::Database;
use timebox::prompt::{self, AssumeYes, Prompter};
use timebox::Result;

/// Environment variable overriding the log filter, e.g. `TIMEBOX_LOG=timebox=debug`.
const LOG_ENV: &str = "TIMEBOX_LOG";

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Commands that don't touch the store.
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return Ok(());
    }

    let data_dir = config::data_dir();
    let mut config = Config::load(&data_dir)?;
    let user = config.resolve_user(cli.user.as_deref());
    let db_path = cli.db.unwrap_or_else(|| data_dir.join(config::STORE_FILE));
    tracing::debug!(user = %user, db = %db_path.display(), "resolved context");

    let mut db = Database::load(&db_path)?;

    match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),

        Commands::Add {
            name,
            estimate,
            date,
            subtasks,
        } => cmd_add(&mut db, &db_path, &user, name, estimate, date, subtasks),

        Commands::Subtask {
            parent,
            name,
            estimate,
        } => cmd_subtask(&mut db, &db_path, &user, parent, name, estimate),

        Commands::Today { date, sort, json } => cmd_today(&db, &user, date, sort, json),

        Commands::View { id } => cmd_view(&db, &user, id),

        Commands::Complete { id, actual } => {
            let mut prompter = prompt::terminal();
            cmd_complete(&mut db, &db_path, &user, id, actual, &mut prompter)
        }

        Commands::Delete { id, yes } => {
            let mut prompter: Box<dyn Prompter> = if yes {
                Box::new(AssumeYes)
            } else {
                Box::new(prompt::terminal())
            };
            cmd_delete(&mut db, &db_path, &user, id, prompter.as_mut())
        }

        Commands::Stats { json } => cmd_stats(&db, &user, json),

        Commands::Profile { name } => cmd_profile(&mut config, &data_dir, &user, name),
    }
}
