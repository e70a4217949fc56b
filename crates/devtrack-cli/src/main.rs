//! devtrack CLI
//!
//! Command-line interface for devtrack - live device locations from a
//! tracking backend.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use devtrack_core::{Config, Tracker};

mod commands;
mod output;

use commands::edit::Edit;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "devtrack")]
#[command(about = "devtrack - live device locations from your tracking backend")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List devices
    #[command(alias = "ls")]
    Devices {
        /// Include hidden devices
        #[arg(short, long)]
        all: bool,
    },
    /// Show one device
    Show {
        /// Device ID
        id: String,
    },
    /// Poll continuously and print devices as they change
    Watch {
        /// Seconds between polls (defaults to poll_interval_secs)
        #[arg(short, long)]
        interval: Option<u64>,
        /// Include hidden devices
        #[arg(short, long)]
        all: bool,
    },
    /// Sign in with a bearer token
    Login {
        /// Token to use (read from stdin when omitted)
        #[arg(long)]
        token: Option<String>,
    },
    /// Sign out and fall back to public locations
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Set a device nickname (empty to clear)
    Nickname {
        /// Device ID
        id: String,
        /// New nickname
        name: String,
    },
    /// Set a device color
    Color {
        /// Device ID
        id: String,
        /// Color value, e.g. red or #ff0000
        color: String,
    },
    /// Hide a device from listings
    Hide {
        /// Device ID
        id: String,
    },
    /// Show a hidden device again
    Unhide {
        /// Device ID
        id: String,
    },
    /// Show status (backend, session, last sync)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, backend_url, poll_interval_secs,
        /// request_timeout_secs, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands must work even when the current config is unusable
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config);

    let tracker = Tracker::from_config(config)?;

    match cli.command {
        Commands::Devices { all } => commands::devices::list(&tracker, all, &output).await,
        Commands::Show { id } => commands::devices::show(&tracker, &id, &output).await,
        Commands::Watch { interval, all } => {
            commands::watch::watch(&tracker, interval, all, &output).await
        }
        Commands::Login { token } => commands::session::login(&tracker, token, &output).await,
        Commands::Logout => commands::session::logout(&tracker, &output).await,
        Commands::Whoami => commands::session::whoami(&tracker, &output).await,
        Commands::Nickname { id, name } => {
            commands::edit::apply(&tracker, &id, Edit::Nickname(name), &output).await
        }
        Commands::Color { id, color } => {
            commands::edit::apply(&tracker, &id, Edit::Color(color), &output).await
        }
        Commands::Hide { id } => {
            commands::edit::apply(&tracker, &id, Edit::Hidden(true), &output).await
        }
        Commands::Unhide { id } => {
            commands::edit::apply(&tracker, &id, Edit::Hidden(false), &output).await
        }
        Commands::Status => commands::status::show(&tracker, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging
///
/// Only initializes if DEVTRACK_LOG environment variable is set.
/// Logs to config.log_file when set, otherwise to stderr.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("DEVTRACK_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "devtrack_core={},devtrack_cli={}",
        log_level, log_level
    ));

    let Some(log_path) = &config.log_file else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    };

    let log_file = match File::create(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}
