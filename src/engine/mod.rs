// src/engine/mod.rs

//! Orchestration engine for assetflow.
//!
//! This module ties together:
//! - the scheduler (one run at a time, serialized through the event loop)
//! - the trigger queue (what happens when triggers arrive while a run is
//!   active)
//! - the main runtime event loop that reacts to:
//!   - file-watch triggers
//!   - run completions
//!   - shutdown signals
//!
//! Serializing runs through a single loop is what guarantees that two runs
//! never write the Build Output Tree concurrently.

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Manual trigger (CLI subcommand, initial watch build).
    Manual,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Runtime options used by the event loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once no run is active and no triggers are
    /// queued (used for one-shot invocations in tests).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from watchers, schedulers, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task should be (logically) triggered.
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// The in-flight scheduler run finished.
    RunCompleted { task: TaskName, success: bool },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod queue;
pub mod runtime;

pub use queue::TriggerQueue;
pub use runtime::Runtime;
