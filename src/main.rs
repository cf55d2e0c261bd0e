// ABOUTME: Entry point for the regkeep CLI application.
// ABOUTME: Parses arguments, loads configuration and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use regkeep::config::Config;
use regkeep::error::{Error, Result};
use regkeep::output::{Output, OutputMode};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise --verbose picks debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("regkeep=debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode::from_flags(cli.json, cli.quiet);

    if let Err(e) = run(cli, mode).await {
        let kind = e.kind().map(|k| k.as_str());
        Output::new(mode).error(&e.to_string(), kind);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let output = Output::new(mode);

    match cli.command {
        Commands::Push { name } => commands::push(config, name, output).await,
        Commands::Digest { name } => commands::digest(config, name, output).await,
        Commands::Delete {
            name,
            digest,
            keep_remote,
        } => commands::delete(config, name, digest, keep_remote, output).await,
    }
}

/// Explicit `--config` must exist; a discovered file is optional.
fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Config::load(path);
    }

    let cwd = env::current_dir()?;
    match Config::discover(&cwd) {
        Ok(config) => Ok(config),
        Err(Error::ConfigNotFound(_)) => {
            tracing::debug!(dir = %cwd.display(), "no config file, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e),
    }
}
