pub mod actions;
pub mod menu;

use std::{io, path::PathBuf};

use actions::HabitActions;
use anyhow::Result;
use clap::{Parser, Subcommand};
use menu::run_menu;
use tracing::{info, level_filters::LevelFilter};

use crate::{
    storage::json_storage::{JsonFileStorage, DEFAULT_DATA_FILE},
    utils::{clock::DefaultClock, dir::create_application_default_path, logging::enable_logging},
};

#[derive(Parser, Debug)]
#[command(name = "daily-habits", version, long_about = None)]
#[command(about = "Track daily habits from the terminal", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(
        long,
        env = "DAILY_HABITS_FILE",
        default_value = DEFAULT_DATA_FILE,
        help = "File with habits. Created on the first change"
    )]
    file: PathBuf,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(long = "log-filter", help = "Log level, for example \"debug\"")]
    log_filter: Option<LevelFilter>,
    #[arg(
        long = "log-dir",
        help = "Directory for logs. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Open the interactive menu. This is the default")]
    Menu,
    #[command(about = "Add a new habit")]
    Add { name: String },
    #[command(about = "List habits with their numbers")]
    List,
    #[command(about = "Mark habit with the given number as done today")]
    Done { index: usize },
    #[command(about = "Show how many times each habit was done")]
    Progress,
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = args
        .log_filter
        .or_else(|| args.log.then_some(LevelFilter::TRACE));
    // Missing log directory only costs the log file, the tracker itself still works.
    let log_dir = args
        .log_dir
        .map_or_else(create_application_default_path, Ok)
        .inspect_err(|e| eprintln!("Warning: logs won't be saved to a file: {e}"))
        .ok();
    if let Err(e) = enable_logging(log_dir.as_deref(), logging_level, args.log) {
        eprintln!("Warning: failed to write logs into {log_dir:?}: {e}");
        enable_logging(None, logging_level, args.log)?;
    }

    info!("Using habit file {:?}", args.file);
    let actions = HabitActions::new(JsonFileStorage::new(args.file), Box::new(DefaultClock));
    let mut output = io::stdout().lock();

    match args.commands.unwrap_or(Commands::Menu) {
        Commands::Menu => run_menu(&actions, &mut io::stdin().lock(), &mut output)?,
        Commands::Add { name } => actions.add(&name, &mut output)?,
        Commands::List => {
            actions.view(&mut output)?;
        }
        Commands::Done { index } => actions.mark_done(index, &mut output)?,
        Commands::Progress => actions.progress(&mut output)?,
    }
    Ok(())
}
