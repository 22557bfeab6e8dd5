mod calc;
mod cmd;
mod data;
mod logging;
mod ui;

use clap::{ArgAction, Parser, Subcommand};
use logging::LogTarget;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "yearcal", about = "scrollable year calendar with events")]
struct Cli {
    /// Directory holding config.yaml, events.json and logs (default: ./config)
    #[arg(long, default_value = "./config", global = true)]
    config_dir: PathBuf,

    /// Seed the event list from this JSON file instead of <config-dir>/events.json
    #[arg(long, global = true)]
    events: Option<PathBuf>,

    /// Year to show (default: the current year)
    #[arg(long, global = true, allow_negative_numbers = true)]
    year: Option<i32>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config.yaml into the config directory
    Init,
    /// Print the week grid of a year
    Grid {
        #[arg(value_name = "YEAR", allow_negative_numbers = true)]
        grid_year: i32,
    },
    /// List the seeded events, optionally only those in --year
    Events,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_dir = if cli.config_dir.is_absolute() {
        cli.config_dir.clone()
    } else {
        std::env::current_dir()?.join(&cli.config_dir)
    };
    data::persistence::set_config_dir(config_dir.clone());

    // Checked before logging, which creates logs/ inside the directory.
    let auto_init = cli.command.is_none() && dir_needs_init(&config_dir);

    let log_dir = config_dir.join("logs");
    let target = match cli.command {
        None => LogTarget::Dir(&log_dir),
        Some(_) => LogTarget::Stderr,
    };
    let _guard = logging::init(cli.verbose, target)?;

    if auto_init {
        eprintln!(
            "Config directory '{}' is missing or empty, running init...",
            config_dir.display()
        );
        cmd::init::run()?;
    }

    let events = cli.events.as_deref();
    match cli.command {
        None => cmd::root::run(cli.year, events),
        Some(Commands::Init) => cmd::init::run(),
        Some(Commands::Grid { grid_year }) => cmd::grid::run(grid_year),
        Some(Commands::Events) => cmd::events::run(cli.year, events),
    }
}

/// Returns true when `dir` does not exist or exists but contains no files.
fn dir_needs_init(dir: &Path) -> bool {
    if !dir.exists() {
        return true;
    }
    dir.read_dir()
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
