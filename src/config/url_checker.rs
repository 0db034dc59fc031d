// ABOUTME: Post-deploy URL check configuration.
// ABOUTME: Polls an HTTP endpoint until its body contains the expected text.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct UrlCheckerConfig {
    /// URL template, expanded with the stack environment.
    pub check_url: String,

    /// Text the response body must contain, expanded with the stack environment.
    pub expect: String,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}
