// ABOUTME: Application-wide error types for strata.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::artifacts::ArtifactError;
use crate::config::{DocumentError, EnvError, TemplateError};
use crate::deploy::DeployError;
use crate::layers::LayerError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("unknown stack '{name}' (available: {})", .available.join(", "))]
    UnknownStack {
        name: String,
        available: Vec<String>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Layers(#[from] LayerError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
