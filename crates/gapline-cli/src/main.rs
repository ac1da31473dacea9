use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "gapline-cli", version, about = "Gapline CLI")]
struct Cli {
    /// Config file (default: ~/.config/gapline/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out a schedule document
    Layout(commands::layout::LayoutArgs),
    /// List the idle gaps of a schedule document
    Gaps(commands::gaps::GapsArgs),
    /// Show layout constants for a viewport width
    Profile(commands::profile::ProfileArgs),
    /// Show which items are happening now
    Current(commands::current::CurrentArgs),
    /// Lay out once, then keep the current-item tracker running
    Watch(commands::watch::WatchArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    // stdout carries command output; logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Layout(args) => commands::layout::run(args, config_path),
        Commands::Gaps(args) => commands::gaps::run(args, config_path),
        Commands::Profile(args) => commands::profile::run(args),
        Commands::Current(args) => commands::current::run(args, config_path),
        Commands::Watch(args) => commands::watch::run(args, config_path),
        Commands::Config { action } => commands::config::run(action, config_path),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
