// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines global flags, all subcommands, and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Dependency-ordered stack deployment with rollout confirmation")]
#[command(version)]
pub struct Cli {
    /// Config file (default: strata.yml discovered in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Environment overlay to apply (defined in config)
    #[arg(short, long, global = true)]
    pub environment: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the config, required environment, and stack documents offline
    Validate,

    /// Print stacks grouped into dependency layers
    Layers {
        /// Only stacks with a stack_index, plus their dependencies
        #[arg(long)]
        only_pushable: bool,
    },

    /// Build and upload every artifact of a stack
    PublishArtifacts {
        stack: String,

        /// Directory acting as the artifact store
        #[arg(long)]
        store: PathBuf,
    },

    /// Delete uploads beyond each artifact's history length
    CleanArtifacts {
        stack: String,

        /// Directory acting as the artifact store
        #[arg(long)]
        store: PathBuf,

        /// Report what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },

    /// Print where an artifact is uploaded
    ArtifactLocation { stack: String, artifact: String },
}
