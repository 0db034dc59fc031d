// ABOUTME: Artifact definitions: archive sources, compression, destination, and history.
// ABOUTME: Every artifact has at least one source and keeps at least one upload.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use super::compression::Compression;
use super::deserialize::{deserialize_history_length, deserialize_sources};
use super::env_value::EnvValue;

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    #[serde(deserialize_with = "deserialize_sources")]
    pub sources: NonEmpty<ArtifactSource>,

    #[serde(default)]
    pub compression: Compression,

    /// Environment used to expand `upload_to`, file contents, and commands.
    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    /// Destination template, e.g. `releases/app/{BUILD}.tar.gz`.
    pub upload_to: String,

    /// Number of most recent uploads kept by cleanup.
    #[serde(
        default = "default_history_length",
        deserialize_with = "deserialize_history_length"
    )]
    pub history_length: usize,
}

fn default_history_length() -> usize {
    5
}

/// Something that ends up inside an artifact archive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactSource {
    /// Copy a local file or directory into the archive.
    Path { host: PathBuf, archive: PathBuf },

    /// Write templated content to a file in the archive.
    File { content: String, path: PathBuf },

    /// Run a shell command in a scratch directory and archive its outputs.
    Command {
        run: String,
        add_into_tar: Vec<ArchivePath>,
    },
}

/// A path produced by a command, and where it lands in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArchivePath {
    pub from: PathBuf,
    pub to: PathBuf,
}
