// ABOUTME: Stack definitions: template, parameters, dependencies, and post-deploy behaviour.
// ABOUTME: Resolves hard dependencies from explicit lists and stack-output parameters.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use super::artifact::ArtifactConfig;
use super::confirmation::ConfirmationConfig;
use super::document::{self, DocumentError, Parameter};
use super::env_value::{EnvError, EnvValue};
use super::url_checker::UrlCheckerConfig;
use crate::types::StackName;

/// All stacks of one deployment set, keyed by name.
pub type Stacks = BTreeMap<String, Stack>;

#[derive(Debug, Clone, Deserialize)]
pub struct Stack {
    /// Key of this stack in the config file.
    #[serde(skip)]
    pub name: String,

    /// Directory relative paths in this stack resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,

    #[serde(default)]
    stack_name: Option<StackName>,

    pub template: TemplateSource,

    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,

    #[serde(default)]
    pub params_json: Option<PathBuf>,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub build_after: Vec<String>,

    #[serde(default)]
    pub ignore_deps: bool,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub confirmation: Option<ConfirmationConfig>,

    /// Suspend scheduled scaling actions on the confirmation group while building.
    #[serde(default)]
    pub suspend_actions: bool,

    #[serde(default)]
    pub skip_update_if_equivalent: Vec<EquivalenceCheck>,

    #[serde(default)]
    pub artifact_retention_after_deployment: bool,

    #[serde(default)]
    pub artifacts: BTreeMap<String, ArtifactConfig>,

    #[serde(default)]
    pub url_checker: Option<UrlCheckerConfig>,

    /// Stacks with an index are "pushable" and take part in pushable-only layering.
    #[serde(default)]
    pub stack_index: Option<u32>,
}

/// Where a stack's declarative template comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TemplateSource {
    Path(PathBuf),
    Inline(serde_json::Map<String, serde_json::Value>),
}

/// A parameter value passed to the provisioning service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// An output of another stack; makes that stack a hard dependency.
    Output { stack: String, output: String },
    Value(EnvValue),
}

impl ParamValue {
    /// Name of the stack this value reads from, if any.
    pub fn referenced_stack(&self) -> Option<&str> {
        match self {
            ParamValue::Output { stack, .. } => Some(stack),
            ParamValue::Value(_) => None,
        }
    }
}

/// Two values that, when equal, mean the remote stack needs no update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EquivalenceCheck {
    pub lhs: ParamValue,
    pub rhs: ParamValue,
}

impl Stack {
    /// Name of the stack on the provisioning service.
    pub fn stack_name(&self) -> &str {
        self.stack_name
            .as_ref()
            .map(StackName::as_str)
            .unwrap_or(&self.name)
    }

    pub(crate) fn has_explicit_stack_name(&self) -> bool {
        self.stack_name.is_some()
    }

    pub fn is_pushable(&self) -> bool {
        self.stack_index.is_some()
    }

    /// Hard dependencies: explicit ones first, then stacks referenced by
    /// parameters and equivalence checks. No duplicates.
    pub fn dependencies(&self) -> Vec<&str> {
        let referenced = self
            .params
            .values()
            .chain(
                self.skip_update_if_equivalent
                    .iter()
                    .flat_map(|check| [&check.lhs, &check.rhs]),
            )
            .filter_map(ParamValue::referenced_stack);

        let mut deps: Vec<&str> = Vec::new();
        for dep in self.dependencies.iter().map(String::as_str).chain(referenced) {
            if dep != self.name && !deps.contains(&dep) {
                deps.push(dep);
            }
        }
        deps
    }

    /// Load and shape-check the template document.
    pub fn template_document(&self) -> Result<serde_json::Value, DocumentError> {
        let value = match &self.template {
            TemplateSource::Inline(map) => serde_json::Value::Object(map.clone()),
            TemplateSource::Path(path) => document::read_json(&self.resolve_path(path))?,
        };
        document::validate_template(&value)?;
        Ok(value)
    }

    /// Load the parameters file, if the stack has one.
    pub fn params_file(&self) -> Result<Vec<Parameter>, DocumentError> {
        match &self.params_json {
            Some(path) => {
                let value = document::read_json(&self.resolve_path(path))?;
                document::parse_params(&value)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Every unresolvable variable across the stack env, the confirmation env,
    /// and literal parameters, reported together.
    pub fn find_missing_env(&self) -> Result<(), EnvError> {
        let confirmation_env = self.confirmation.iter().flat_map(|c| c.env.values());
        let param_values = self.params.values().filter_map(|param| match param {
            ParamValue::Value(value) => Some(value),
            ParamValue::Output { .. } => None,
        });

        let mut missing = BTreeSet::new();
        for value in self.env.values().chain(confirmation_env).chain(param_values) {
            if let Err(e) = value.resolve() {
                missing.extend(e.vars);
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(EnvError {
                vars: missing.into_iter().collect(),
            })
        }
    }

    pub(crate) fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
