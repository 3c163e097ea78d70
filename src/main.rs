//! actkit - local CI cache and artifact services
//!
//! CLI entry point that dispatches to subcommands.

use actkit::cli::{Cli, Commands};
use actkit::config::ConfigManager;
use actkit::error::ActkitResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ActkitResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("actkit=warn"),
        1 => EnvFilter::new("actkit=info"),
        _ => EnvFilter::new("actkit=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    debug!("Using config at {}", config_manager.path().display());

    // Dispatch to command
    match cli.command {
        Commands::Cache(args) => actkit::cli::commands::cache(args, &config).await,
        Commands::Artifact(args) => actkit::cli::commands::artifact(args, &config).await,
        Commands::Config(args) => {
            actkit::cli::commands::config(args, &config_manager, &config).await
        }
    }
}
