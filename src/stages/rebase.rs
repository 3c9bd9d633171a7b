// src/stages/rebase.rs

use std::path::PathBuf;

use crate::pipeline::{FileRecord, Stage};

/// Strips a leading prefix from record paths, turning project-relative
/// source paths into output-relative ones (`src/images/a/b.png` under prefix
/// `src/images` becomes `a/b.png`). Records outside the prefix pass through
/// unchanged.
pub struct RebaseStage {
    prefix: PathBuf,
}

impl RebaseStage {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Stage for RebaseStage {
    fn name(&self) -> &str {
        "rebase"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        match record.path.strip_prefix(&self.prefix) {
            Ok(stripped) => {
                let rebased = stripped.to_path_buf();
                Ok(Some(record.with_path(rebased)))
            }
            Err(_) => Ok(Some(record)),
        }
    }
}
