//! Backchat - chat-history portal core
//!
//! Main entry point for the Backchat server and CLI.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use backchat::cli::{Cli, Commands};
use backchat::commands;
use backchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let cli = Cli::parse_args();

    // If the user supplied a storage path on the CLI (or via env),
    // mirror it into BACKCHAT_HISTORY_DB so the storage initializer can
    // pick it up. This keeps callers unchanged while allowing
    // `SqliteStorage::new()` to honor an override.
    if let Some(db_path) = &cli.storage_path {
        std::env::set_var("BACKCHAT_HISTORY_DB", db_path);
        tracing::info!("Using storage DB override from CLI: {}", db_path);
    }

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!("Starting chat-history API server");
            if let Some(b) = &bind {
                tracing::debug!("Using bind override: {}", b);
            }

            commands::serve::run_server(config, bind).await?;
            Ok(())
        }
        Commands::History { command } => {
            commands::history::handle_history(command, &config)?;
            Ok(())
        }
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("backchat=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
