// ABOUTME: Stack status wait configuration.
// ABOUTME: Poll interval and overall timeout for create/update convergence.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct StackWaitConfig {
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_timeout() -> Duration {
    Duration::from_secs(1200)
}

impl Default for StackWaitConfig {
    fn default() -> Self {
        StackWaitConfig {
            interval: default_interval(),
            timeout: default_timeout(),
        }
    }
}
