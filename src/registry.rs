// src/registry.rs

//! Task registry: named tasks, their prerequisites and their work units.
//!
//! Tasks are registered once at startup and live for the process lifetime.
//! The registry remembers registration order, which the scheduler uses as the
//! tie-break for stable topological ordering.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::IncrementalCache;
use crate::config::Config;
use crate::engine::TaskName;
use crate::errors::{AssetflowError, Result};

/// Immutable per-run context handed to every task's work unit.
#[derive(Clone)]
pub struct RunContext {
    pub config: Arc<Config>,
    pub cache: Arc<IncrementalCache>,
    /// Directory all configured paths and patterns are resolved against.
    pub project_root: PathBuf,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("project_root", &self.project_root)
            .finish_non_exhaustive()
    }
}

/// A task's unit of work. Runs on the blocking pool; returns failure through
/// the error, never by side channel.
pub type TaskWork = Arc<dyn Fn(&RunContext) -> anyhow::Result<()> + Send + Sync>;

/// A registered task.
#[derive(Clone)]
pub struct TaskDef {
    pub name: TaskName,
    /// Direct prerequisites, in declaration order.
    pub deps: Vec<TaskName>,
    pub work: TaskWork,
    /// Position in registration order; used for stable scheduling.
    pub index: usize,
}

impl fmt::Debug for TaskDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDef")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Stores named tasks keyed by name, preserving registration order.
#[derive(Debug, Default)]
pub struct Registry {
    tasks: HashMap<TaskName, TaskDef>,
    order: Vec<TaskName>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under a unique name.
    ///
    /// Fails with [`AssetflowError::DuplicateTask`] if the name is taken.
    /// Prerequisites are not resolved here; unknown names surface when a run
    /// is planned.
    pub fn register<F>(&mut self, name: &str, deps: &[&str], work: F) -> Result<()>
    where
        F: Fn(&RunContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        if self.tasks.contains_key(name) {
            return Err(AssetflowError::DuplicateTask(name.to_string()));
        }

        let def = TaskDef {
            name: name.to_string(),
            deps: deps.iter().map(|s| s.to_string()).collect(),
            work: Arc::new(work),
            index: self.order.len(),
        };

        self.order.push(name.to_string());
        self.tasks.insert(name.to_string(), def);
        Ok(())
    }

    /// Look up a task by name.
    ///
    /// Fails with [`AssetflowError::UnknownTask`] if absent.
    pub fn get(&self, name: &str) -> Result<&TaskDef> {
        self.tasks
            .get(name)
            .ok_or_else(|| AssetflowError::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Task names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
