use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedhook_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "feedhook")]
#[command(author, version, about = "Relay new RSS/Atom items to a webhook")]
struct Cli {
    /// Configuration file (defaults to ~/.config/feedhook/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the feed continuously and serve the health endpoint
    Watch,
    /// Check the feed once and exit
    Check,
    /// Inspect or overwrite the stored last link
    State {
        #[command(subcommand)]
        action: StateAction,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// Print the stored last link
    Show,
    /// Overwrite the stored last link
    Set {
        /// Link to record as already announced
        link: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Arc::new(AppConfig::load(cli.config.as_deref())?);

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Some(ref env_file) = config.env_file {
        tracing::debug!("Loaded environment from {}", env_file.display());
    }

    tracing::debug!(config = ?config.redacted(), "Configuration loaded");

    match cli.command {
        Some(Commands::Watch) | None => commands::watch::run(config).await,
        Some(Commands::Check) => commands::check::run(&config).await,
        Some(Commands::State { action }) => match action {
            StateAction::Show => commands::state::show(&config).await,
            StateAction::Set { link } => commands::state::set(&config, &link).await,
        },
    }
}
