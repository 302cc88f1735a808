//! Restify - cache-aware REST client
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use restify::cli::{Cli, Commands};
use restify::config::ConfigManager;
use restify::error::RestifyResult;
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

async fn run() -> RestifyResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug; general.verbose counts as one level
    let level = cli.verbose.max(u8::from(config.general.verbose));
    let filter = match level {
        0 => EnvFilter::new("restify=warn"),
        1 => EnvFilter::new("restify=info"),
        _ => EnvFilter::new("restify=debug"),
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

    debug!("Using config {}", config_manager.path().display());

    // Config commands edit the file as written, without the endpoint override
    if let Commands::Config(args) = cli.command {
        return restify::cli::commands::config(args, &config_manager, &config).await;
    }

    if let Some(endpoint) = cli.endpoint {
        config.client.endpoint = endpoint;
    }

    match cli.command {
        Commands::Get(args) => restify::cli::commands::get(args, &config).await,
        Commands::Post(args) => restify::cli::commands::post(args, &config).await,
        Commands::Put(args) => restify::cli::commands::put(args, &config).await,
        Commands::Delete(args) => restify::cli::commands::delete(args, &config).await,
        Commands::Find(args) => restify::cli::commands::find(args, &config).await,
        Commands::Cache(args) => restify::cli::commands::cache(args, &config).await,
        Commands::Config(_) => unreachable!("Config handled above"),
    }
}
