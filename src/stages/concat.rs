// src/stages/concat.rs

use std::path::PathBuf;

use crate::pipeline::{FileRecord, Stage};

/// Aggregate stage joining the whole record set into a single output file.
///
/// Inputs arrive sorted by path (the pipeline's deterministic aggregate
/// order), so the concatenation result is stable across runs regardless of
/// discovery or cache interleaving.
pub struct ConcatStage {
    output_name: PathBuf,
}

impl ConcatStage {
    pub fn new(output_name: impl Into<PathBuf>) -> Self {
        Self {
            output_name: output_name.into(),
        }
    }
}

impl Stage for ConcatStage {
    fn name(&self) -> &str {
        "concat"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        Ok(Some(record))
    }

    fn is_aggregate(&self) -> bool {
        true
    }

    fn apply_set(&self, records: Vec<FileRecord>) -> anyhow::Result<Vec<FileRecord>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut joined = Vec::new();
        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                joined.push(b'\n');
            }
            joined.extend_from_slice(&record.contents);
        }

        Ok(vec![FileRecord::new(self.output_name.clone(), joined)])
    }
}
