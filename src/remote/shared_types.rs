// ABOUTME: Shared types used across the remote service traits.
// ABOUTME: StackRequest, StackDescription, WriteOutcome, ObjectInfo.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::config::Parameter;

/// Everything needed to create or update one stack.
#[derive(Debug, Clone, PartialEq)]
pub struct StackRequest {
    pub stack_name: String,
    pub template: serde_json::Value,
    pub params: Vec<Parameter>,
    pub tags: BTreeMap<String, String>,
}

/// What the provisioning service reports about a stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDescription {
    /// Raw status name, classified with `Status::find`.
    pub status: String,
    pub outputs: HashMap<String, String>,
}

/// What a create-or-update call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    /// The service found nothing to change.
    NoChanges,
}

/// An object in the artifact store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}
