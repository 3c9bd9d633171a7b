// src/dag/plan.rs

//! Pure run planning: prerequisite closure, cycle detection, stable
//! topological ordering grouped into dependency levels.
//!
//! Planning is deterministic and side-effect free so that ordering semantics
//! can be tested without executing any task.

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

use crate::engine::TaskName;
use crate::errors::{AssetflowError, Result};
use crate::registry::Registry;

/// A resolved execution order for one requested task.
///
/// `levels[0]` holds tasks with no prerequisites inside the closure; every
/// task appears in a level strictly after all of its prerequisites. Within a
/// level, tasks are sorted by registration order, which makes the flattened
/// order stable across runs.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub target: TaskName,
    pub levels: Vec<Vec<TaskName>>,
}

impl ExecutionPlan {
    /// The flattened order: every task after all of its prerequisites.
    pub fn ordered(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().flatten().map(|s| s.as_str())
    }

    /// All task names in the plan.
    pub fn task_set(&self) -> HashSet<TaskName> {
        self.levels.iter().flatten().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Resolve the transitive prerequisite set of `target` and produce an
/// [`ExecutionPlan`].
///
/// Fails with [`AssetflowError::UnknownTask`] if the target or any reachable
/// prerequisite is unregistered, and with
/// [`AssetflowError::CyclicDependency`] (naming the cycle) if the closure is
/// not acyclic. Cycle detection runs before anything else can execute, so a
/// cyclic graph never partially runs.
pub fn plan(registry: &Registry, target: &str) -> Result<ExecutionPlan> {
    let closure = resolve_closure(registry, target)?;
    detect_cycles(registry, &closure)?;

    let levels = build_levels(registry, &closure);

    Ok(ExecutionPlan {
        target: target.to_string(),
        levels,
    })
}

/// Collect `target` plus every transitively reachable prerequisite.
fn resolve_closure(registry: &Registry, target: &str) -> Result<HashSet<TaskName>> {
    let mut closure = HashSet::new();
    let mut stack = vec![target.to_string()];

    while let Some(name) = stack.pop() {
        if closure.contains(&name) {
            continue;
        }
        let def = registry.get(&name)?;
        closure.insert(name);
        stack.extend(def.deps.iter().cloned());
    }

    Ok(closure)
}

/// Detect cycles within the closure and report the full cycle path.
///
/// Edge direction: dep -> task, so a topological order of this graph runs
/// prerequisites first.
fn detect_cycles(registry: &Registry, closure: &HashSet<TaskName>) -> Result<()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in closure {
        graph.add_node(name.as_str());
    }

    for name in closure {
        let def = registry.get(name)?;
        for dep in def.deps.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    for scc in tarjan_scc(&graph) {
        let cyclic = scc.len() > 1 || (scc.len() == 1 && graph.contains_edge(scc[0], scc[0]));
        if cyclic {
            return Err(AssetflowError::CyclicDependency(format_cycle(
                registry, &scc,
            )));
        }
    }

    Ok(())
}

/// Walk prerequisite edges inside the strongly connected component to print
/// an actual cycle path, e.g. `a -> b -> c -> a`.
fn format_cycle(registry: &Registry, scc: &[&str]) -> String {
    let members: HashSet<&str> = scc.iter().copied().collect();

    let start = *scc
        .iter()
        .min_by_key(|name| registry.get(name).map(|d| d.index).unwrap_or(usize::MAX))
        .expect("scc is never empty");

    let mut path = vec![start];
    let mut seen: HashSet<&str> = HashSet::from([start]);
    let mut current = start;

    loop {
        let Ok(def) = registry.get(current) else {
            break;
        };
        let Some(next) = def
            .deps
            .iter()
            .map(String::as_str)
            .find(|d| members.contains(d))
        else {
            break;
        };

        if next == start || !seen.insert(next) {
            path.push(next);
            break;
        }
        path.push(next);
        current = next;
    }

    path.join(" -> ")
}

/// Group the closure into dependency levels and sort each level by
/// registration order.
fn build_levels(registry: &Registry, closure: &HashSet<TaskName>) -> Vec<Vec<TaskName>> {
    let mut depth: HashMap<TaskName, usize> = HashMap::new();

    fn depth_of(
        registry: &Registry,
        closure: &HashSet<TaskName>,
        depth: &mut HashMap<TaskName, usize>,
        name: &str,
    ) -> usize {
        if let Some(&d) = depth.get(name) {
            return d;
        }

        // Acyclicity is established before levels are built, so recursion
        // terminates.
        let def = registry.get(name).expect("closure members are registered");
        let d = def
            .deps
            .iter()
            .filter(|dep| closure.contains(*dep))
            .map(|dep| depth_of(registry, closure, depth, dep) + 1)
            .max()
            .unwrap_or(0);

        depth.insert(name.to_string(), d);
        d
    }

    let mut max_depth = 0;
    for name in closure {
        max_depth = max_depth.max(depth_of(registry, closure, &mut depth, name));
    }

    let mut levels: Vec<Vec<TaskName>> = vec![Vec::new(); max_depth + 1];
    for (name, d) in depth {
        levels[d].push(name);
    }

    for level in levels.iter_mut() {
        level.sort_by_key(|name| registry.get(name).map(|d| d.index).unwrap_or(usize::MAX));
    }

    levels
}
