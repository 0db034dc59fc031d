// ABOUTME: Stack operations trait for the provisioning service.
// ABOUTME: Describe, create-or-update, and resolve logical resource ids.

use super::shared_types::{StackDescription, StackRequest, WriteOutcome};
use crate::types::{LogicalId, PhysicalId};
use async_trait::async_trait;

/// Stack lifecycle operations on the provisioning service.
#[async_trait]
pub trait StackOps: Send + Sync {
    /// Current status and outputs of a stack.
    ///
    /// Returns `StackError::NotFound` when the stack does not exist.
    async fn describe(&self, stack_name: &str) -> Result<StackDescription, StackError>;

    /// Create the stack if it is absent, update it otherwise.
    async fn create_or_update(&self, request: &StackRequest) -> Result<WriteOutcome, StackError>;

    /// Physical id of a resource declared in the stack's template.
    async fn physical_id(
        &self,
        stack_name: &str,
        logical_id: &LogicalId,
    ) -> Result<PhysicalId, StackError>;
}

/// Errors from stack operations.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("stack not found: {0}")]
    NotFound(String),

    #[error("resource {logical_id} not found in stack {stack_name}")]
    ResourceNotFound {
        stack_name: String,
        logical_id: String,
    },

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("provisioning service error: {0}")]
    Service(String),
}
