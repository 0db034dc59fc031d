// ABOUTME: Builds, uploads, locates, and prunes versioned stack artifacts.
// ABOUTME: Archives are assembled from paths, templated files, and command outputs.

mod archive;
mod error;

pub use error::ArtifactError;

use snafu::{OptionExt, ResultExt};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::config::{
    ArtifactConfig, ArtifactSource, EnvError, Stack, interpolate, resolve_env_map,
};
use crate::remote::{ObjectInfo, ObjectStore};
use archive::Entry;
use error::{
    ArchiveSnafu, CommandFailedSnafu, EnvSnafu, JoinSnafu, MissingBuildEnvSnafu, ScratchSnafu,
    SpawnSnafu, StoreSnafu, TemplateSnafu, UnknownArtifactSnafu,
};

/// What a cleanup removed, or would have removed on a dry run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub kept: usize,
    pub dry_run: bool,
}

/// Oldest objects beyond the newest `history_length`, oldest first.
pub fn select_expired(mut objects: Vec<ObjectInfo>, history_length: usize) -> Vec<ObjectInfo> {
    objects.sort_by(|a, b| {
        a.last_modified
            .cmp(&b.last_modified)
            .then_with(|| a.key.cmp(&b.key))
    });
    let expired = objects.len().saturating_sub(history_length);
    objects.truncate(expired);
    objects
}

/// Check the env of every artifact of `stack` without needing a store.
pub fn find_missing_build_env(stack: &Stack) -> Result<(), EnvError> {
    let missing: BTreeSet<String> = stack
        .artifacts
        .values()
        .filter_map(|artifact| resolve_env_map(&artifact.env).err())
        .flat_map(|e| e.vars)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EnvError {
            vars: missing.into_iter().collect(),
        })
    }
}

/// Where `artifact` of `stack` is uploaded, with its env applied.
pub fn locate(stack: &Stack, artifact: &str) -> Result<String, ArtifactError> {
    let config = stack.artifacts.get(artifact).context(UnknownArtifactSnafu {
        stack: stack.name.as_str(),
        artifact,
        available: stack.artifacts.keys().cloned().collect::<Vec<_>>(),
    })?;
    let (_, dest) = destination(artifact, config)?;
    Ok(dest)
}

fn ensure_build_env(stack: &Stack) -> Result<(), ArtifactError> {
    find_missing_build_env(stack).context(MissingBuildEnvSnafu {
        stack: stack.name.as_str(),
    })
}

/// Directory part of an upload destination, with its trailing slash.
fn directory_of(dest: &str) -> &str {
    match dest.rfind('/') {
        Some(idx) => &dest[..=idx],
        None => "",
    }
}

pub struct ArtifactManager {
    store: Arc<dyn ObjectStore>,
    dry_run: bool,
}

impl ArtifactManager {
    pub fn new(store: Arc<dyn ObjectStore>, dry_run: bool) -> Self {
        Self { store, dry_run }
    }

    /// Build and upload every artifact, stopping at the first failure.
    ///
    /// Nothing is built or uploaded unless every artifact's env resolves.
    pub async fn publish(&self, stack: &Stack) -> Result<Vec<String>, ArtifactError> {
        ensure_build_env(stack)?;
        let mut uploaded = Vec::new();

        for (name, artifact) in &stack.artifacts {
            let (env, dest) = destination(name, artifact)?;
            let scratch = tempfile::tempdir().context(ScratchSnafu)?;

            let mut entries = Vec::new();
            for source in artifact.sources.iter() {
                match source {
                    ArtifactSource::Path { host, archive } => entries.push(Entry::Path {
                        host: stack.resolve_path(host),
                        archive: archive.clone(),
                    }),
                    ArtifactSource::File { content, path } => entries.push(Entry::File {
                        content: interpolate(content, &env).context(TemplateSnafu {
                            artifact: name.as_str(),
                        })?,
                        path: path.clone(),
                    }),
                    ArtifactSource::Command { run, add_into_tar } => {
                        run_command(name, run, &env, scratch.path()).await?;
                        entries.extend(add_into_tar.iter().map(|p| Entry::Path {
                            host: scratch.path().join(&p.from),
                            archive: p.to.clone(),
                        }));
                    }
                }
            }

            let file = tempfile::Builder::new()
                .suffix(&format!(".{}", artifact.compression.extension()))
                .tempfile()
                .context(ScratchSnafu)?;
            let path = file.path().to_path_buf();
            let compression = artifact.compression;
            tokio::task::spawn_blocking(move || archive::write_archive(&path, &entries, compression))
                .await
                .context(JoinSnafu)?
                .context(ArchiveSnafu {
                    artifact: name.as_str(),
                })?;

            tracing::info!(artifact = %name, %dest, "uploading artifact");
            self.store
                .upload(file.path(), &dest)
                .await
                .context(StoreSnafu { key: dest.as_str() })?;
            uploaded.push(dest);
        }

        Ok(uploaded)
    }

    /// Delete all but the newest `history_length` uploads next to each artifact's destination.
    pub async fn cleanup(&self, stack: &Stack) -> Result<CleanupReport, ArtifactError> {
        ensure_build_env(stack)?;
        let mut report = CleanupReport {
            dry_run: self.dry_run,
            ..Default::default()
        };

        for (name, artifact) in &stack.artifacts {
            let (_, dest) = destination(name, artifact)?;
            let prefix = directory_of(&dest);

            let objects = self
                .store
                .list(prefix)
                .await
                .context(StoreSnafu { key: prefix })?;
            let total = objects.len();
            let expired = select_expired(objects, artifact.history_length);
            report.kept += total - expired.len();

            for object in expired {
                tracing::info!(
                    artifact = %name,
                    key = %object.key,
                    dry_run = self.dry_run,
                    "removing old artifact"
                );
                self.store
                    .delete(&object.key, self.dry_run)
                    .await
                    .context(StoreSnafu {
                        key: object.key.as_str(),
                    })?;
                report.deleted.push(object.key);
            }
        }

        Ok(report)
    }
}

/// Resolved env and formatted destination of one artifact.
fn destination(
    name: &str,
    artifact: &ArtifactConfig,
) -> Result<(HashMap<String, String>, String), ArtifactError> {
    let env = resolve_env_map(&artifact.env).context(EnvSnafu { artifact: name })?;
    let dest = interpolate(&artifact.upload_to, &env).context(TemplateSnafu { artifact: name })?;
    Ok((env, dest))
}

async fn run_command(
    artifact: &str,
    command: &str,
    env: &HashMap<String, String>,
    dir: &Path,
) -> Result<(), ArtifactError> {
    tracing::info!(artifact, command, "running artifact command");
    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .envs(env)
        .output()
        .await
        .context(SpawnSnafu { artifact, command })?;

    if !output.status.success() {
        return CommandFailedSnafu {
            artifact,
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .fail();
    }
    Ok(())
}
