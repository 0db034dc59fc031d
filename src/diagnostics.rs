// ABOUTME: Diagnostics accumulator for non-fatal warnings during a deploy run.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

use serde::Serialize;

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Move every warning from `other` into this accumulator without re-logging.
    pub fn absorb(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A queue message that did not decode as `result:instance:output`.
    pub fn malformed_message(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::MalformedMessage,
            message: message.into(),
        }
    }

    /// A queue message from an instance outside the confirmation target set.
    pub fn stray_message(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::StrayMessage,
            message: message.into(),
        }
    }

    /// Scheduled scaling actions could not be resumed after a failed build.
    pub fn scaling_resume(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ScalingResume,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MalformedMessage,
    StrayMessage,
    /// Scheduled actions may still be suspended on the group.
    ScalingResume,
}
