// src/errors.rs

//! Crate-wide error taxonomy.

use thiserror::Error;

use crate::dag::RunReport;
use crate::pipeline::StageFailure;

#[derive(Error, Debug)]
pub enum AssetflowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Task already registered: {0}")]
    DuplicateTask(String),

    #[error("Task not found: {0}")]
    UnknownTask(String),

    #[error("Cycle detected in task graph: {0}")]
    CyclicDependency(String),

    /// One or more tasks failed; the report lists completed, skipped and
    /// failed task names.
    #[error("{0}")]
    PartialFailure(RunReport),

    #[error(transparent)]
    Stage(#[from] StageFailure),

    #[error("Failed to bind server port: {0}")]
    Bind(std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetflowError>;
