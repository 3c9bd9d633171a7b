// src/stages/filter.rs

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::pipeline::{FileRecord, Stage};

/// Keeps records whose path matches any of the given glob patterns and drops
/// the rest.
pub struct FilterStage {
    keep: GlobSet,
}

impl FilterStage {
    pub fn new(patterns: &[&str]) -> anyhow::Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pat in patterns {
            builder.add(Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?);
        }
        Ok(Self {
            keep: builder.build()?,
        })
    }
}

impl Stage for FilterStage {
    fn name(&self) -> &str {
        "filter"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        let rel = record.path.to_string_lossy().replace('\\', "/");
        if self.keep.is_match(&rel) {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }
}
