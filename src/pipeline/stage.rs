// src/pipeline/stage.rs

use std::fmt;
use std::path::PathBuf;

use crate::pipeline::record::FileRecord;

/// A single transform step in a file-set pipeline.
///
/// Every external collaborator (style compiler, image packer, placeholder
/// substitution, …) satisfies this interface; composition is a plain ordered
/// list, never inheritance. Per-record stages map one record to at most one
/// record (`None` drops it from the set, as filtering stages do). Aggregate
/// stages consume the whole set at once and must rely on the documented
/// deterministic input order: sorted by record path.
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    /// Per-record transform; `Ok(None)` drops the record from the output set.
    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>>;

    /// True when the stage consumes the whole record set at once
    /// (concatenation, sprite packing). Such stages receive their input
    /// sorted by path.
    fn is_aggregate(&self) -> bool {
        false
    }

    /// Aggregate transform. The default maps `apply` over the set.
    fn apply_set(&self, records: Vec<FileRecord>) -> anyhow::Result<Vec<FileRecord>> {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            if let Some(record) = self.apply(record)? {
                out.push(record);
            }
        }
        Ok(out)
    }
}

impl fmt::Debug for dyn Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stage({})", self.name())
    }
}

/// A pipeline run aborted inside a stage. Names the stage and, when the
/// failure concerns a single record, the offending file.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: String,
    pub record: Option<PathBuf>,
    pub source: anyhow::Error,
}

impl StageFailure {
    pub fn new(stage: &str, record: Option<PathBuf>, source: anyhow::Error) -> Self {
        Self {
            stage: stage.to_string(),
            record,
            source,
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record {
            Some(record) => write!(
                f,
                "stage '{}' failed on {}: {:#}",
                self.stage,
                record.display(),
                self.source
            ),
            None => write!(f, "stage '{}' failed: {:#}", self.stage, self.source),
        }
    }
}

impl std::error::Error for StageFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}
