// ABOUTME: Scaling group operations trait.
// ABOUTME: List in-service instances and suspend/resume scheduled actions.

use crate::types::{InstanceId, PhysicalId};
use async_trait::async_trait;

/// Operations on an auto-scaling group.
#[async_trait]
pub trait ScalingOps: Send + Sync {
    /// Instances of the group whose lifecycle state is InService.
    async fn in_service_instances(&self, group: &PhysicalId)
    -> Result<Vec<InstanceId>, ScalingError>;

    async fn suspend_scheduled_actions(&self, group: &PhysicalId) -> Result<(), ScalingError>;

    async fn resume_scheduled_actions(&self, group: &PhysicalId) -> Result<(), ScalingError>;
}

/// Errors from scaling group operations.
#[derive(Debug, thiserror::Error)]
pub enum ScalingError {
    #[error("scaling group not found: {0}")]
    GroupNotFound(String),

    #[error("scaling service error: {0}")]
    Service(String),
}
