// ABOUTME: Deployment confirmation configuration.
// ABOUTME: Names the scaling group, message queue, and expected version message.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::env_value::EnvValue;
use crate::types::LogicalId;

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationConfig {
    /// Logical id of the scaling group inside the stack template.
    pub auto_scaling_group_id: LogicalId,

    pub deployment_queue: String,

    /// Template for the output every instance must report, e.g. `app-{BUILD}`.
    pub version_message: String,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    /// Confirm right after this stack builds instead of after its build_after stacks.
    #[serde(default)]
    pub straight_after: bool,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(1800)
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}
