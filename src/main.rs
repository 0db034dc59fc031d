// ABOUTME: Entry point for the strata CLI application.
// ABOUTME: Parses arguments, loads config, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use strata::config::Config;
use strata::error::Result;
use strata::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::discover(&env::current_dir()?)?,
    };

    // Apply environment overlay if specified
    match &cli.environment {
        Some(name) => config.for_environment(name),
        None => Ok(config),
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let config = load_config(&cli)?;
    let output = Output::new(mode);

    match cli.command {
        Commands::Validate => commands::validate(&config, &output),
        Commands::Layers { only_pushable } => commands::layers(&config, only_pushable, &output),
        Commands::PublishArtifacts { stack, store } => {
            commands::publish_artifacts(&config, &stack, &store, output).await
        }
        Commands::CleanArtifacts {
            stack,
            store,
            dry_run,
        } => commands::clean_artifacts(&config, &stack, &store, dry_run, output).await,
        Commands::ArtifactLocation { stack, artifact } => {
            commands::artifact_location(&config, &stack, &artifact, output)
        }
    }
}
