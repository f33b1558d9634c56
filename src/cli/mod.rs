use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::store;

pub mod commands;

use self::commands::{ShowArgs, TuiArgs};

#[derive(Parser, Debug)]
#[command(
    name = "lettertui",
    version,
    about = "Terminal reader for threaded correspondence"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over LETTERTUI_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over LETTERTUI_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Read letters from this JSON file instead of `<data>/letters.json`
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui(TuiArgs),
    /// Print the inbox
    List,
    /// Print one letter and its conversation
    Show(ShowArgs),
}

#[derive(Debug, Clone)]
enum LogTarget {
    Stderr,
    File(PathBuf),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Tui(TuiArgs::default()));
    let target = match command {
        Commands::Tui(_) => LogTarget::File(paths.log_dir.join("lettertui.log")),
        Commands::List | Commands::Show(_) => LogTarget::Stderr,
    };
    init_tracing(&cli.log_level, &target)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    let mut config = loader.load_or_init()?;
    if let Some(path) = cli.store {
        config.store.path = path;
    }
    let store = store::init(&config.store)?;
    let config = Arc::new(config);

    match command {
        Commands::Tui(args) => commands::run_tui(config, store, args),
        Commands::List => commands::list_letters(&store),
        Commands::Show(args) => commands::show_letter(&config, &store, &args),
    }
}

fn init_tracing(level: &str, target: &LogTarget) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match target {
            LogTarget::Stderr => fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init(),
            LogTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .init();
            }
        }
        Ok::<(), anyhow::Error>(())
    })
    .map(|_| ())
}
