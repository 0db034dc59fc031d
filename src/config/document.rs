// ABOUTME: Loading and shape checks for stack template and parameter documents.
// ABOUTME: Templates need a Resources object; params are ParameterKey/ParameterValue pairs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("malformed {what}: {reason}")]
    Shape { what: &'static str, reason: String },
}

/// A single parameter handed to the provisioning service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "ParameterKey")]
    pub key: String,
    #[serde(rename = "ParameterValue")]
    pub value: String,
}

pub fn read_json(path: &Path) -> Result<serde_json::Value, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| DocumentError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn validate_template(value: &serde_json::Value) -> Result<(), DocumentError> {
    let shape = |reason: &str| DocumentError::Shape {
        what: "stack template",
        reason: reason.to_string(),
    };

    let object = value
        .as_object()
        .ok_or_else(|| shape("top level must be an object"))?;

    match object.get("Resources") {
        Some(serde_json::Value::Object(resources)) if !resources.is_empty() => {}
        Some(_) => return Err(shape("Resources must be a non-empty object")),
        None => return Err(shape("Resources is required")),
    }

    for section in ["Parameters", "Outputs"] {
        if let Some(v) = object.get(section)
            && !v.is_object()
        {
            return Err(shape(&format!("{section} must be an object")));
        }
    }

    Ok(())
}

pub fn parse_params(value: &serde_json::Value) -> Result<Vec<Parameter>, DocumentError> {
    let params: Vec<Parameter> =
        serde_json::from_value(value.clone()).map_err(|e| DocumentError::Shape {
            what: "parameters",
            reason: e.to_string(),
        })?;

    if let Some(empty) = params.iter().position(|p| p.key.is_empty()) {
        return Err(DocumentError::Shape {
            what: "parameters",
            reason: format!("entry {empty} has an empty ParameterKey"),
        });
    }

    Ok(params)
}
