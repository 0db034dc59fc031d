// ABOUTME: Per-invocation deploy state.
// ABOUTME: Tracks which stacks were checked and built so each happens once per run.

use std::collections::HashSet;

use crate::diagnostics::Diagnostics;

/// State of one top-level deploy invocation.
///
/// Stack definitions stay read-only; everything a run learns lives here and
/// is dropped with it.
#[derive(Debug, Default)]
pub struct DeployRun {
    made: HashSet<String>,
    checked: HashSet<String>,
    order: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl DeployRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_made(&self, stack: &str) -> bool {
        self.made.contains(stack)
    }

    /// Record a completed build. Returns false if it was already recorded.
    pub fn mark_made(&mut self, stack: &str) -> bool {
        if self.made.insert(stack.to_string()) {
            self.order.push(stack.to_string());
            true
        } else {
            false
        }
    }

    /// Record a sanity check. Returns false if the stack was checked already.
    pub fn mark_checked(&mut self, stack: &str) -> bool {
        self.checked.insert(stack.to_string())
    }

    /// Stacks built in this run, in build order.
    pub fn built(&self) -> &[String] {
        &self.order
    }
}
