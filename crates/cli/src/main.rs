//! ragdesk CLI
//!
//! Entry point for the `ragdesk` binary: runs the HTTP server and offers
//! the same ingest and question answering operations from the terminal.

mod commands;
mod server;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ClearCommand, ServeCommand, StatsCommand, UploadCommand};
use ragdesk_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// ragdesk - question answering over your own documents
#[derive(Parser, Debug)]
#[command(name = "ragdesk")]
#[command(about = "Grounded question answering over uploaded documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the index, uploads and config (default: ./.ragdesk)
    #[arg(short, long, global = true, env = "RAGDESK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "RAGDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeCommand),

    /// Index files or directories
    Upload(UploadCommand),

    /// Ask a question against the index
    Ask(AskCommand),

    /// Show index statistics
    Stats(StatsCommand),

    /// Remove every indexed chunk
    Clear(ClearCommand),
}

/// Load configuration with the global flags standing in for their
/// environment variables, so `--data-dir` and `--config` also decide which
/// YAML file is read.
fn load_config(cli: &Cli) -> AppResult<AppConfig> {
    let data_dir = cli.data_dir.clone();
    let config_file = cli.config.clone();

    let config = AppConfig::load_with_env(|key| match key {
        "RAGDESK_DATA_DIR" if data_dir.is_some() => {
            data_dir.as_ref().map(|p| p.to_string_lossy().into_owned())
        }
        "RAGDESK_CONFIG" if config_file.is_some() => {
            config_file.as_ref().map(|p| p.to_string_lossy().into_owned())
        }
        _ => std::env::var(key).ok(),
    })?;

    Ok(config.with_overrides(
        cli.data_dir.clone(),
        cli.log_level.clone(),
        cli.verbose,
        cli.no_color,
    ))
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = load_config(&cli)?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("ragdesk starting");
    tracing::debug!("Data dir: {:?}", config.data_dir);
    tracing::debug!("Index: {:?}", config.index_path());

    config.ensure_data_dir()?;

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Upload(_) => "upload",
        Commands::Ask(_) => "ask",
        Commands::Stats(_) => "stats",
        Commands::Clear(_) => "clear",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(config).await,
        Commands::Upload(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Clear(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
