// ABOUTME: Error types for deploy runs.
// ABOUTME: Covers misconfiguration, remote stack state, confirmation, and collaborator failures.

use crate::artifacts::ArtifactError;
use crate::config::{EnvError, TemplateError};
use crate::layers::LayerError;
use crate::poll::PollError;
use crate::remote::{QueueError, ScalingError, StackError};

use super::confirm::ConfirmationReport;

/// Errors that can end a deploy run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("no such stack '{looking_for}' (available: {})", .available.join(", "))]
    NoSuchStack {
        looking_for: String,
        available: Vec<String>,
    },

    #[error(transparent)]
    Layers(#[from] LayerError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("stack '{stack}': {source}")]
    Document {
        stack: String,
        source: crate::config::DocumentError,
    },

    #[error("stack '{stack}' is misconfigured: {reason}")]
    Misconfigured { stack: String, reason: String },

    /// The stack was already failed before we touched it.
    #[error("stack '{stack}' is in a failed state ({status}) and needs manual attention")]
    StackInFailedState { stack: String, status: String },

    #[error("stack '{stack}' failed to build ({status})")]
    StackFailed { stack: String, status: String },

    #[error("stack '{stack}' rolled back ({status})")]
    RolledBack { stack: String, status: String },

    #[error("timed out waiting for stack '{stack}' (last status {status})")]
    WaitTimeout { stack: String, status: String },

    #[error("stack '{stack}' has no output '{output}'")]
    MissingOutput { stack: String, output: String },

    #[error("bad deployment of '{stack}': {report}")]
    BadDeployment {
        stack: String,
        report: ConfirmationReport,
    },

    #[error("timed out confirming '{stack}'; no answer from {}", .pending.join(", "))]
    ConfirmationTimeout { stack: String, pending: Vec<String> },

    #[error("url check for '{stack}' failed: {reason}")]
    UrlCheck { stack: String, reason: String },

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Scaling(#[from] ScalingError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

/// Error category for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or incomplete configuration; found before anything is changed.
    Configuration,
    /// The remote stack is, or ended up, in a state we cannot proceed from.
    RemoteState,
    /// Instances reported the wrong version, or never reported.
    Confirmation,
    Artifact,
    /// A remote service call itself failed.
    Collaborator,
}

impl DeployError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DeployError::NoSuchStack { .. }
            | DeployError::Layers(_)
            | DeployError::Env(_)
            | DeployError::Template(_)
            | DeployError::Document { .. }
            | DeployError::Misconfigured { .. } => ErrorCategory::Configuration,
            DeployError::StackInFailedState { .. }
            | DeployError::StackFailed { .. }
            | DeployError::RolledBack { .. }
            | DeployError::WaitTimeout { .. }
            | DeployError::MissingOutput { .. }
            | DeployError::UrlCheck { .. } => ErrorCategory::RemoteState,
            DeployError::BadDeployment { .. } | DeployError::ConfirmationTimeout { .. } => {
                ErrorCategory::Confirmation
            }
            DeployError::Artifact(_) => ErrorCategory::Artifact,
            DeployError::Stack(_)
            | DeployError::Scaling(_)
            | DeployError::Queue(_)
            | DeployError::Poll(_) => ErrorCategory::Collaborator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let failed = DeployError::StackFailed {
            stack: "app".into(),
            status: "CREATE_FAILED".into(),
        };
        assert_eq!(failed.category(), ErrorCategory::RemoteState);

        let env = DeployError::from(EnvError {
            vars: vec!["BUILD".into()],
        });
        assert_eq!(env.category(), ErrorCategory::Configuration);

        let timeout = DeployError::ConfirmationTimeout {
            stack: "app".into(),
            pending: vec!["i-1".into()],
        };
        assert_eq!(timeout.category(), ErrorCategory::Confirmation);
        assert!(timeout.to_string().contains("i-1"));

        let service = DeployError::from(StackError::Service("throttled".into()));
        assert_eq!(service.category(), ErrorCategory::Collaborator);
    }
}
