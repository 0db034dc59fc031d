// ABOUTME: Artifact error types with SNAFU pattern.
// ABOUTME: Each variant carries the artifact or object key it failed on.

use snafu::Snafu;

use crate::config::{EnvError, TemplateError};
use crate::remote::StoreError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ArtifactError {
    #[snafu(display(
        "stack '{stack}' has no artifact '{artifact}' (available: {})",
        available.join(", ")
    ))]
    UnknownArtifact {
        stack: String,
        artifact: String,
        available: Vec<String>,
    },

    #[snafu(display("artifacts of stack '{stack}': {source}"))]
    MissingBuildEnv { stack: String, source: EnvError },

    #[snafu(display("artifact '{artifact}': {source}"))]
    Env { artifact: String, source: EnvError },

    #[snafu(display("artifact '{artifact}': {source}"))]
    Template {
        artifact: String,
        source: TemplateError,
    },

    #[snafu(display("artifact '{artifact}': could not run `{command}`: {source}"))]
    Spawn {
        artifact: String,
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("artifact '{artifact}': `{command}` exited with {status}: {stderr}"))]
    CommandFailed {
        artifact: String,
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[snafu(display("could not create scratch space: {source}"))]
    Scratch { source: std::io::Error },

    #[snafu(display("artifact '{artifact}': failed to write archive: {source}"))]
    Archive {
        artifact: String,
        source: std::io::Error,
    },

    #[snafu(display("archive task failed: {source}"))]
    Join { source: tokio::task::JoinError },

    #[snafu(display("object store error on '{key}': {source}"))]
    Store { key: String, source: StoreError },
}
