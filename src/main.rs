//! propctl - build.prop editing through a root shell
//!
//! Entry point: parses the command line, loads the configuration,
//! initializes logging and runs the requested command.

use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use propctl::commands::{
    DensityCommand, DeviceClassCommand, GetCommand, GetpropCommand, ListCommand,
    RestartUiCommand, SetCommand,
};
use propctl::core::{AppConfig, APP_NAME, VERSION};
use propctl::store::PropStore;

#[derive(Debug, Parser)]
#[command(name = "propctl", version, about = "Edit build.prop through a root shell")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read a key from a property file
    Get(GetCommand),
    /// Set a key in build.prop
    Set(SetCommand),
    /// Query a live system property
    Getprop(GetpropCommand),
    /// List properties in a file
    List(ListCommand),
    /// Change the LCD density
    Density(DensityCommand),
    /// Classify a display as phone, hybrid or tablet
    DeviceClass(DeviceClassCommand),
    /// Restart system UI and settings
    RestartUi,
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .await
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => AppConfig::load().await?,
    };

    // Initialize logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config
            .log_level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or(Level::INFO)
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    debug!("{} v{} starting", APP_NAME, VERSION);

    let store = PropStore::new(config);
    let output = match &cli.command {
        Command::Get(cmd) => cmd.execute(&store).await?,
        Command::Set(cmd) => cmd.execute(&store).await?,
        Command::Getprop(cmd) => cmd.execute(&store).await?,
        Command::List(cmd) => cmd.execute(&store).await?,
        Command::Density(cmd) => cmd.execute(&store).await?,
        Command::DeviceClass(cmd) => cmd.execute()?,
        Command::RestartUi => RestartUiCommand.execute(&store).await?,
    };

    println!("{}", output);
    Ok(())
}
