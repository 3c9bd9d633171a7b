// src/pipeline/mod.rs

//! File-set pipelines: discovery, composable stages, output commit.
//!
//! A pipeline run walks an explicit state machine:
//!
//! `Idle → Discovering → Transforming → Writing → Complete`
//!
//! with `Failed` reachable from any state on error. `Failed` and `Complete`
//! are terminal; every run starts from a fresh `Idle`. A stage error aborts
//! the run and surfaces as a [`StageFailure`] naming the stage and the
//! offending record; it is logged by the scheduler, never retried.

pub mod discover;
pub mod output;
pub mod record;
pub mod stage;

use std::path::PathBuf;

use tracing::{debug, trace};

pub use discover::FileSet;
pub use output::{write_records, OutputSpec, WriteMode};
pub use record::FileRecord;
pub use stage::{Stage, StageFailure};

use crate::engine::TaskName;
use crate::registry::RunContext;

/// States of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Discovering,
    Transforming,
    Writing,
    Complete,
    Failed,
}

/// Summary of a completed pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// States traversed, in order, ending in `Complete`.
    pub states: Vec<RunState>,
    /// Destination-relative paths written to the output tree.
    pub written: Vec<PathBuf>,
    /// Records served from the incremental cache without transformation.
    pub cache_hits: usize,
    /// Records that went through the per-record transform chain.
    pub transformed: usize,
}

/// A file-set pipeline: discovery patterns, an ordered stage list, and an
/// output destination.
///
/// The leading run of per-record stages is memoized through the incremental
/// cache, keyed by the task identity and each input record's path and
/// signature. Aggregate stages (and anything after the first one) always
/// run: they combine the per-record results, cached or fresh.
#[derive(Debug)]
pub struct Pipeline {
    task: TaskName,
    fileset: FileSet,
    stages: Vec<Box<dyn Stage>>,
    output: OutputSpec,
}

impl Pipeline {
    pub fn new(
        task: impl Into<TaskName>,
        fileset: FileSet,
        stages: Vec<Box<dyn Stage>>,
        output: OutputSpec,
    ) -> Self {
        Self {
            task: task.into(),
            fileset,
            stages,
            output,
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn fileset(&self) -> &FileSet {
        &self.fileset
    }

    /// Execute one run against the project in `ctx`.
    pub fn run(&self, ctx: &RunContext) -> Result<PipelineReport, StageFailure> {
        let mut states = vec![RunState::Idle];
        let advance = |states: &mut Vec<RunState>, next: RunState| {
            trace!(task = %self.task, ?next, "pipeline state");
            states.push(next);
        };

        advance(&mut states, RunState::Discovering);
        let records = self
            .fileset
            .discover(&ctx.project_root)
            .map_err(|e| self.fail(&mut states, "discover", None, e))?;

        advance(&mut states, RunState::Transforming);
        let split = self
            .stages
            .iter()
            .position(|s| s.is_aggregate())
            .unwrap_or(self.stages.len());
        let (head, tail) = self.stages.split_at(split);

        // Stage lists differ between environments (minification,
        // recompression), so cached outputs must never cross envs.
        let scope = if ctx.config.project.env.is_production() {
            format!("{}.prod", self.task)
        } else {
            format!("{}.dev", self.task)
        };

        let mut survivors = Vec::with_capacity(records.len());
        let mut cache_hits = 0usize;
        let mut transformed = 0usize;

        for record in records {
            let input_path = record.path.clone();
            let input_sig = record.signature;

            if !head.is_empty() {
                if let Some(cached) = ctx.cache.get(&scope, &input_path, &input_sig) {
                    cache_hits += 1;
                    survivors.push(cached);
                    continue;
                }
            }

            let mut current = Some(record);
            for stage in head {
                let Some(record) = current.take() else { break };
                let path = record.path.clone();
                current = stage
                    .apply(record)
                    .map_err(|e| self.fail(&mut states, stage.name(), Some(path), e))?;
            }

            if !head.is_empty() {
                transformed += 1;
            }

            if let Some(out) = current {
                if !head.is_empty() {
                    ctx.cache.put(&scope, &input_path, &input_sig, &out);
                }
                survivors.push(out);
            }
        }

        // Aggregate stages and everything after them. Aggregates receive
        // their input sorted by path, the documented deterministic order.
        let mut current_set = survivors;
        for stage in tail {
            if stage.is_aggregate() {
                current_set.sort_by(|a, b| a.path.cmp(&b.path));
                current_set = stage
                    .apply_set(current_set)
                    .map_err(|e| self.fail(&mut states, stage.name(), None, e))?;
            } else {
                let mut next = Vec::with_capacity(current_set.len());
                for record in current_set {
                    let path = record.path.clone();
                    if let Some(record) = stage
                        .apply(record)
                        .map_err(|e| self.fail(&mut states, stage.name(), Some(path), e))?
                    {
                        next.push(record);
                    }
                }
                current_set = next;
            }
        }

        advance(&mut states, RunState::Writing);
        let written = write_records(&ctx.project_root, &self.task, &self.output, &current_set)
            .map_err(|e| self.fail(&mut states, "write", None, e))?;

        advance(&mut states, RunState::Complete);
        debug!(
            task = %self.task,
            written = written.len(),
            cache_hits,
            transformed,
            "pipeline complete"
        );

        Ok(PipelineReport {
            states,
            written,
            cache_hits,
            transformed,
        })
    }

    fn fail(
        &self,
        states: &mut Vec<RunState>,
        stage: &str,
        record: Option<PathBuf>,
        source: anyhow::Error,
    ) -> StageFailure {
        states.push(RunState::Failed);
        StageFailure::new(stage, record, source)
    }
}
