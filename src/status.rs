// ABOUTME: Remote stack lifecycle statuses classified from their names.
// ABOUTME: Process-wide registry of singleton Status records keyed by name.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Name of the sentinel status reported when the remote stack is absent.
pub const NONEXISTENT: &str = "NONEXISTENT";

/// Statuses the remote service is known to report.
const CATALOGUE: &[&str] = &[
    "CREATE_IN_PROGRESS",
    "CREATE_FAILED",
    "CREATE_COMPLETE",
    "ROLLBACK_IN_PROGRESS",
    "ROLLBACK_FAILED",
    "ROLLBACK_COMPLETE",
    "DELETE_IN_PROGRESS",
    "DELETE_FAILED",
    "DELETE_COMPLETE",
    "UPDATE_IN_PROGRESS",
    "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
    "UPDATE_COMPLETE",
    "UPDATE_ROLLBACK_IN_PROGRESS",
    "UPDATE_ROLLBACK_FAILED",
    "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS",
    "UPDATE_ROLLBACK_COMPLETE",
];

static REGISTRY: LazyLock<RwLock<HashMap<String, Arc<Status>>>> = LazyLock::new(|| {
    let mut statuses: HashMap<String, Arc<Status>> = CATALOGUE
        .iter()
        .map(|name| (name.to_string(), Arc::new(Status::classify(name))))
        .collect();

    let mut nonexistent = Status::classify(NONEXISTENT);
    nonexistent.exists = false;
    statuses.insert(NONEXISTENT.to_string(), Arc::new(nonexistent));

    RwLock::new(statuses)
});

/// A remote stack status with every facet precomputed from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    name: String,
    pub exists: bool,
    pub failed: bool,
    pub complete: bool,
    pub in_progress: bool,
    pub cleanup_in_progress: bool,
    pub is_create: bool,
    pub is_delete: bool,
    pub is_update: bool,
    pub is_rollback: bool,
}

impl Status {
    /// Look up the status called `name`, registering it on first sight.
    ///
    /// Names the catalogue doesn't know are classified purely from their text,
    /// so statuses added to the remote service later still behave sensibly.
    pub fn find(name: &str) -> Arc<Status> {
        if let Some(status) = REGISTRY.read().get(name) {
            return Arc::clone(status);
        }

        let mut registry = REGISTRY.write();
        Arc::clone(
            registry
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Status::classify(name))),
        )
    }

    /// The sentinel for a stack that does not exist remotely.
    pub fn nonexistent() -> Arc<Status> {
        Status::find(NONEXISTENT)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether orchestration can stop waiting on this status.
    pub fn is_terminal(&self) -> bool {
        self.complete || self.failed
    }

    fn classify(name: &str) -> Self {
        Self {
            name: name.to_string(),
            exists: true,
            failed: name.ends_with("FAILED"),
            complete: name.ends_with("COMPLETE"),
            in_progress: name.ends_with("IN_PROGRESS"),
            cleanup_in_progress: name.ends_with("CLEANUP_IN_PROGRESS"),
            is_create: name.starts_with("CREATE"),
            is_delete: name.starts_with("DELETE"),
            is_update: name.starts_with("UPDATE") && !name.starts_with("UPDATE_ROLLBACK"),
            is_rollback: name.starts_with("ROLLBACK") || name.starts_with("UPDATE_ROLLBACK"),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
