// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use crate::engine::TaskName;
use crate::registry::Registry;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct TaskNode {
    /// Direct prerequisites: tasks that must complete before this one starts.
    deps: Vec<TaskName>,
    /// Direct dependents: tasks that list this one as a prerequisite.
    dependents: Vec<TaskName>,
}

/// Simple in-memory adjacency view over a resolved set of tasks.
///
/// Acyclicity is established by [`plan`](crate::dag::plan) before a graph is
/// used for execution; here we just keep adjacency information for dependent
/// skipping and diagnostics.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: HashMap<TaskName, TaskNode>,
}

impl TaskGraph {
    /// Build adjacency for the given subset of registered tasks.
    ///
    /// Edges to tasks outside the subset are ignored; the planner guarantees
    /// the subset is prerequisite-closed, so this only matters for callers
    /// constructing partial views.
    pub fn from_registry(registry: &Registry, subset: &HashSet<TaskName>) -> Self {
        let mut nodes: HashMap<TaskName, TaskNode> = HashMap::new();

        for name in subset {
            // Subset members always resolve; `get` only fails for foreign names.
            let Ok(def) = registry.get(name) else {
                continue;
            };
            let deps = def
                .deps
                .iter()
                .filter(|d| subset.contains(*d))
                .cloned()
                .collect();
            nodes.insert(
                name.clone(),
                TaskNode {
                    deps,
                    dependents: Vec::new(),
                },
            );
        }

        let names: Vec<TaskName> = nodes.keys().cloned().collect();
        for name in names {
            let deps = nodes
                .get(&name)
                .map(|n| n.deps.clone())
                .unwrap_or_default();

            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        Self { nodes }
    }

    /// All task names in the graph.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Immediate prerequisites of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Every task reachable from `name` following dependent edges.
    pub fn transitive_dependents(&self, name: &str) -> HashSet<TaskName> {
        let mut seen = HashSet::new();
        let mut stack: Vec<TaskName> = self.dependents_of(name).to_vec();

        while let Some(next) = stack.pop() {
            if seen.insert(next.clone()) {
                stack.extend(self.dependents_of(&next).iter().cloned());
            }
        }

        seen
    }
}
