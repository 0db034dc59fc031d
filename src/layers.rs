// ABOUTME: Dependency layering of stacks into groups that can be processed together.
// ABOUTME: Fixed-point placement over the dependency DAG with explicit cycle detection.

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::config::Stacks;

/// Stack names with no dependency relationship among them, sorted by name.
pub type Layer = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error("stack '{referenced_by}' references unknown stack '{stack}'")]
    UnknownStack {
        stack: String,
        referenced_by: String,
    },

    #[error("dependency cycle among stacks: {}", .stacks.join(", "))]
    Cycle { stacks: Vec<String> },
}

/// Orders a selection of stacks (plus everything they depend on) into layers.
///
/// Every stack lands in the first layer after all of its hard dependencies,
/// so layer `i + 1` only depends on stacks in layers `0..=i`.
#[derive(Debug)]
pub struct Layers<'a> {
    targets: BTreeSet<&'a str>,
    all_stacks: &'a Stacks,
}

impl<'a> Layers<'a> {
    pub fn new(targets: impl IntoIterator<Item = &'a str>, all_stacks: &'a Stacks) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            all_stacks,
        }
    }

    /// Layer every stack, or only the pushable ones (those with a stack index).
    pub fn layered(stacks: &Stacks, only_pushable: bool) -> Result<Vec<Layer>, LayerError> {
        let targets = stacks
            .values()
            .filter(|stack| !only_pushable || stack.is_pushable())
            .map(|stack| stack.name.as_str());
        Layers::new(targets, stacks).compute()
    }

    pub fn compute(&self) -> Result<Vec<Layer>, LayerError> {
        let graph = self.dependency_closure()?;

        let mut placed: BTreeSet<&str> = BTreeSet::new();
        let mut unplaced: BTreeSet<&str> = graph.keys().copied().collect();
        let mut layers = Vec::new();

        while !unplaced.is_empty() {
            let ready: Vec<&str> = unplaced
                .iter()
                .copied()
                .filter(|name| graph[name].iter().all(|dep| placed.contains(dep)))
                .collect();

            if ready.is_empty() {
                return Err(LayerError::Cycle {
                    stacks: unplaced.iter().map(|s| s.to_string()).collect(),
                });
            }

            for name in &ready {
                unplaced.remove(name);
                placed.insert(*name);
            }
            layers.push(ready.into_iter().map(str::to_string).collect());
        }

        Ok(layers)
    }

    /// Targets plus their transitive dependencies, mapped to direct dependencies.
    fn dependency_closure(&self) -> Result<BTreeMap<&'a str, Vec<&'a str>>, LayerError> {
        let mut graph = BTreeMap::new();
        let mut pending: Vec<(&'a str, &'a str)> =
            self.targets.iter().map(|name| (*name, *name)).collect();

        while let Some((name, referenced_by)) = pending.pop() {
            if graph.contains_key(name) {
                continue;
            }

            let (key, stack) = self.all_stacks.get_key_value(name).ok_or_else(|| {
                LayerError::UnknownStack {
                    stack: name.to_string(),
                    referenced_by: referenced_by.to_string(),
                }
            })?;

            let deps = stack.dependencies();
            pending.extend(deps.iter().map(|dep| (*dep, key.as_str())));
            graph.insert(key.as_str(), deps);
        }

        Ok(graph)
    }
}
