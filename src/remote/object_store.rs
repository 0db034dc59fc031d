// ABOUTME: Object store trait for artifact uploads.
// ABOUTME: Upload files, list objects under a prefix, and delete (or pretend to).

use super::shared_types::ObjectInfo;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, local: &Path, dest: &str) -> Result<(), StoreError>;

    /// Objects whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StoreError>;

    /// Delete `key`; with `dry_run` nothing is removed.
    async fn delete(&self, key: &str, dry_run: bool) -> Result<(), StoreError>;
}

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("I/O error on {key}: {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },

    #[error("object store error: {0}")]
    Service(String),
}
