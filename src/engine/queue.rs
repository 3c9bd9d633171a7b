// src/engine/queue.rs

use std::collections::HashSet;

use tracing::debug;

use super::TaskName;

/// Queue of triggers that arrive while a run is already executing.
///
/// Semantics (the queue-behind policy, see DESIGN.md):
/// - Triggers arriving mid-run are coalesced into a single pending batch;
///   triggering the same task five times while a run is active produces one
///   follow-up run, not five.
/// - When the runtime goes idle it calls `drain_pending()` and starts one
///   run per drained task name, in insertion order.
/// - An in-flight run is never cancelled; the output tree stays exclusive to
///   one run at a time.
#[derive(Debug, Default)]
pub struct TriggerQueue {
    pending: Vec<TaskName>,
    seen: HashSet<TaskName>,
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no queued triggers.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Record that a task was triggered while a run is in progress.
    /// Duplicate names coalesce into the existing entry.
    pub fn record_trigger(&mut self, task: &str) {
        if self.seen.insert(task.to_string()) {
            debug!(task = %task, "queued trigger behind active run");
            self.pending.push(task.to_string());
        } else {
            debug!(task = %task, "coalesced trigger into queued batch");
        }
    }

    /// Drain all pending triggers in insertion order.
    pub fn drain_pending(&mut self) -> Vec<TaskName> {
        self.seen.clear();
        std::mem::take(&mut self.pending)
    }
}
