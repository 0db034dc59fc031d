// ABOUTME: Filesystem-backed object store rooted at a local directory.
// ABOUTME: Keys are slash-separated paths relative to the root.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};

use super::object_store::{ObjectStore, StoreError};
use super::shared_types::ObjectInfo;

/// Stores artifacts as plain files under `root`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key onto a path under the root, refusing anything that escapes it.
    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(key.to_string())
        } else {
            StoreError::Io {
                key: key.to_string(),
                source,
            }
        }
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn upload(&self, local: &Path, dest: &str) -> Result<(), StoreError> {
        let target = self.path_for(dest)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_error(dest))?;
        }
        tokio::fs::copy(local, &target)
            .await
            .map_err(io_error(dest))?;
        tracing::info!("Uploaded {} to {}", local.display(), target.display());
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StoreError> {
        let mut objects = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error(prefix)(e)),
            };

            while let Some(entry) = entries.next_entry().await.map_err(io_error(prefix))? {
                let path = entry.path();
                let metadata = entry.metadata().await.map_err(io_error(prefix))?;
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Some(key) = self.key_for(&path) else {
                    continue;
                };
                if !key.starts_with(prefix) {
                    continue;
                }

                let modified = metadata.modified().map_err(io_error(prefix))?;
                objects.push(ObjectInfo {
                    key,
                    last_modified: DateTime::<Utc>::from(modified),
                });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn delete(&self, key: &str, dry_run: bool) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if dry_run {
            tracing::info!("Would delete {} (dry run)", path.display());
            return Ok(());
        }
        tokio::fs::remove_file(&path).await.map_err(io_error(key))
    }
}
