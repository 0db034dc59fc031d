// ABOUTME: Environment variable value types with interpolation support.
// ABOUTME: Handles literal values and references to process environment variables.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// One or more environment variables needed by a stack or artifact are unset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required environment variable(s): {}", .vars.join(", "))]
pub struct EnvError {
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<String, EnvError> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default.clone().ok_or_else(|| EnvError {
                    vars: vec![var.clone()],
                }),
            },
        }
    }
}

/// Resolve every value in the map, reporting all missing variables at once.
pub fn resolve_env_map(map: &HashMap<String, EnvValue>) -> Result<HashMap<String, String>, EnvError> {
    let mut resolved = HashMap::with_capacity(map.len());
    let mut missing = BTreeSet::new();

    for (key, value) in map {
        match value.resolve() {
            Ok(v) => {
                resolved.insert(key.clone(), v);
            }
            Err(e) => missing.extend(e.vars),
        }
    }

    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(EnvError {
            vars: missing.into_iter().collect(),
        })
    }
}

/// Check that every value in the map can currently be resolved.
pub fn find_missing_env(map: &HashMap<String, EnvValue>) -> Result<(), EnvError> {
    resolve_env_map(map).map(|_| ())
}
