// src/dag/scheduler.rs

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::dag::plan::plan;
use crate::dag::TaskGraph;
use crate::engine::TaskName;
use crate::errors::{AssetflowError, Result};
use crate::registry::{Registry, RunContext};

/// Outcome of one scheduler run: which tasks completed, which were skipped
/// because a prerequisite failed, and which failed outright.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub completed: Vec<TaskName>,
    pub skipped: Vec<TaskName>,
    pub failed: Vec<TaskName>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run finished: {} completed, {} failed ({}), {} skipped ({})",
            self.completed.len(),
            self.failed.len(),
            self.failed.join(", "),
            self.skipped.len(),
            self.skipped.join(", "),
        )
    }
}

/// Executes [`ExecutionPlan`]s level by level.
///
/// All tasks at the same dependency depth run concurrently on the blocking
/// pool, bounded by `max_parallel`. A task starts only after every
/// prerequisite has completed; a failed task marks its transitive dependents
/// as skipped without disturbing completed or independent branches. There is
/// no automatic retry — the caller decides whether to re-trigger.
#[derive(Clone)]
pub struct Scheduler {
    registry: Arc<Registry>,
    max_parallel: usize,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("max_parallel", &self.max_parallel)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(registry: Arc<Registry>, max_parallel: Option<usize>) -> Self {
        let default_parallel = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            registry,
            max_parallel: max_parallel.unwrap_or(default_parallel).max(1),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run `target` and its transitive prerequisites.
    ///
    /// Returns the [`RunReport`] on full success, or
    /// [`AssetflowError::PartialFailure`] carrying the same report when any
    /// task failed or was skipped. Unknown tasks and cycles abort before
    /// anything executes.
    pub async fn run(&self, target: &str, ctx: &RunContext) -> Result<RunReport> {
        let plan = plan(&self.registry, target)?;
        let graph = TaskGraph::from_registry(&self.registry, &plan.task_set());

        info!(
            task = %target,
            tasks = plan.len(),
            levels = plan.levels.len(),
            "starting run"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut report = RunReport::default();
        let mut skipped: HashSet<TaskName> = HashSet::new();

        for level in plan.levels.iter() {
            let mut joinset: JoinSet<(TaskName, anyhow::Result<()>)> = JoinSet::new();

            for name in level {
                if skipped.contains(name) {
                    continue;
                }

                let def = self.registry.get(name)?;
                let work = Arc::clone(&def.work);
                let ctx = ctx.clone();
                let name = name.clone();
                let permit = Arc::clone(&semaphore)
                    .acquire_owned()
                    .await
                    .expect("scheduler semaphore never closes");

                debug!(task = %name, "dispatching task");

                joinset.spawn_blocking(move || {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        (work)(&ctx)
                    }))
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("task panicked")));
                    drop(permit);
                    (name, result)
                });
            }

            while let Some(joined) = joinset.join_next().await {
                let (name, result) = match joined {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("task join failed: {e}");
                        continue;
                    }
                };

                match result {
                    Ok(()) => {
                        debug!(task = %name, "task completed");
                        report.completed.push(name);
                    }
                    Err(e) => {
                        error!(task = %name, "task failed: {e:#}");
                        for dependent in graph.transitive_dependents(&name) {
                            skipped.insert(dependent);
                        }
                        report.failed.push(name);
                    }
                }
            }
        }

        report.skipped = skipped.into_iter().collect();
        report.skipped.sort();
        report.completed.sort();
        report.failed.sort();

        if report.is_success() {
            info!(task = %target, completed = report.completed.len(), "run succeeded");
            Ok(report)
        } else {
            Err(AssetflowError::PartialFailure(report))
        }
    }
}
