// ABOUTME: Configuration types and parsing for strata.yml.
// ABOUTME: Handles YAML parsing, load-time validation, and environment overlays.

mod artifact;
mod compression;
mod confirmation;
mod deserialize;
mod document;
mod env_value;
mod stack;
mod template;
mod url_checker;
mod wait;

pub use artifact::{ArchivePath, ArtifactConfig, ArtifactSource};
pub use compression::Compression;
pub use confirmation::ConfirmationConfig;
pub use document::{DocumentError, Parameter, parse_params, validate_template};
pub use env_value::{EnvError, EnvValue, find_missing_env, resolve_env_map};
pub use stack::{EquivalenceCheck, ParamValue, Stack, Stacks, TemplateSource};
pub use template::{TemplateError, interpolate};
pub use url_checker::UrlCheckerConfig;
pub use wait::StackWaitConfig;

use crate::error::{Error, Result};
use crate::layers::{LayerError, Layers};
use crate::types::StackName;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "strata.yml";
pub const CONFIG_FILENAME_ALT: &str = "strata.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".strata/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub stacks: Stacks,

    /// Report deletions instead of performing them.
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub stack_wait: StackWaitConfig,

    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverlay>,

    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Settings merged into every stack when deploying to a named environment.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EnvironmentOverlay {
    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub dry_run: Option<bool>,
}

impl Config {
    /// Parse a config whose relative paths resolve against the working directory.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::parse(yaml, Path::new("."))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        Self::parse(&content, base_dir)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn parse(yaml: &str, base_dir: &Path) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(yaml)?;
        config.base_dir = base_dir.to_path_buf();

        for (name, stack) in config.stacks.iter_mut() {
            stack.name = name.clone();
            stack.base_dir = base_dir.to_path_buf();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for stack in self.stacks.values() {
            if !stack.has_explicit_stack_name() {
                StackName::new(&stack.name).map_err(|e| {
                    Error::InvalidConfig(format!(
                        "stack '{}' needs an explicit stack_name: {}",
                        stack.name, e
                    ))
                })?;
            }

            if stack.suspend_actions && stack.confirmation.is_none() {
                return Err(Error::InvalidConfig(format!(
                    "stack '{}' sets suspend_actions without a confirmation block naming its scaling group",
                    stack.name
                )));
            }

            if let Some(missing) = stack
                .build_after
                .iter()
                .find(|name| !self.stacks.contains_key(name.as_str()))
            {
                return Err(LayerError::UnknownStack {
                    stack: missing.clone(),
                    referenced_by: stack.name.clone(),
                }
                .into());
            }
        }

        // Rejects unknown dependencies and cycles.
        Layers::layered(&self.stacks, false)?;
        Ok(())
    }

    /// Apply the named environment overlay to every stack.
    pub fn for_environment(&self, name: &str) -> Result<Config> {
        let overlay = self
            .environments
            .get(name)
            .ok_or_else(|| Error::UnknownEnvironment(name.to_string()))?;

        let mut merged = self.clone();

        for stack in merged.stacks.values_mut() {
            for (k, v) in &overlay.env {
                stack.env.insert(k.clone(), v.clone());
                if let Some(confirmation) = stack.confirmation.as_mut() {
                    confirmation.env.insert(k.clone(), v.clone());
                }
                for artifact in stack.artifacts.values_mut() {
                    artifact.env.insert(k.clone(), v.clone());
                }
            }

            for (k, v) in &overlay.tags {
                stack.tags.insert(k.clone(), v.clone());
            }
        }

        if let Some(dry_run) = overlay.dry_run {
            merged.dry_run = dry_run;
        }

        Ok(merged)
    }

    pub fn stack(&self, name: &str) -> Result<&Stack> {
        self.stacks.get(name).ok_or_else(|| Error::UnknownStack {
            name: name.to_string(),
            available: self.stacks.keys().cloned().collect(),
        })
    }
}
