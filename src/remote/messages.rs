// ABOUTME: Message source trait for deployment confirmation queues.
// ABOUTME: Returns raw message bodies received since the last poll.

use async_trait::async_trait;

#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Drain the messages that arrived on `queue` since the previous call.
    async fn poll_new_messages(&self, queue: &str) -> Result<Vec<String>, QueueError>;
}

/// Errors from the message source.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue not found: {0}")]
    NotFound(String),

    #[error("queue service error: {0}")]
    Service(String),
}
