// ABOUTME: Bounded polling helper shared by every wait loop.
// ABOUTME: Retries an async check on a fixed interval until done, timed out, or cancelled.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Outcome of a single poll attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Done(T),
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("{action}: timed out after {}s ({attempts} attempts)", .elapsed.as_secs())]
    TimedOut {
        action: String,
        elapsed: Duration,
        attempts: u32,
    },

    #[error("{action}: gave up after {attempts} attempts")]
    Exhausted { action: String, attempts: u32 },

    #[error("{action}: cancelled")]
    Cancelled { action: String },
}

/// Fixed-interval poller with optional timeout, attempt limit, and cancel flag.
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    timeout: Option<Duration>,
    max_attempts: Option<u32>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
            max_attempts: None,
            cancel: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Stop before the next attempt once `flag` is set.
    pub fn cancel_on(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Run `attempt` now and then every interval until it reports `Step::Done`.
    ///
    /// The attempt receives its 1-based attempt number. Errors it returns end
    /// the loop immediately. When a timeout is set, one last attempt runs at
    /// the deadline before giving up.
    pub async fn until<T, E, F, Fut>(&self, action: &str, mut attempt: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Step<T>, E>>,
        E: From<PollError>,
    {
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            if self
                .cancel
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::SeqCst))
            {
                return Err(PollError::Cancelled {
                    action: action.to_string(),
                }
                .into());
            }

            attempts += 1;
            if let Step::Done(value) = attempt(attempts).await? {
                return Ok(value);
            }

            if self.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(PollError::Exhausted {
                    action: action.to_string(),
                    attempts,
                }
                .into());
            }

            let mut pause = self.interval;
            if let Some(timeout) = self.timeout {
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    return Err(PollError::TimedOut {
                        action: action.to_string(),
                        elapsed,
                        attempts,
                    }
                    .into());
                }
                pause = pause.min(timeout - elapsed);
            }

            tracing::debug!(action, attempt = attempts, "still waiting");
            tokio::time::sleep(pause).await;
        }
    }
}
