// src/stages/scss.rs

use std::path::PathBuf;

use anyhow::Context;

use crate::pipeline::{FileRecord, Stage};

/// Compiles SCSS records to CSS via `grass`.
///
/// Partials (file names starting with `_`) are dropped from the output set;
/// they are only reachable through `@use`/`@import` from the entrypoints,
/// resolved against the configured load paths.
pub struct ScssStage {
    load_paths: Vec<PathBuf>,
}

impl ScssStage {
    pub fn new(load_paths: Vec<PathBuf>) -> Self {
        Self { load_paths }
    }
}

impl Stage for ScssStage {
    fn name(&self) -> &str {
        "scss"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        let is_partial = record
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('_'));
        if is_partial {
            return Ok(None);
        }

        let source = record.text()?.to_string();

        let mut options = grass::Options::default();
        for path in &self.load_paths {
            options = options.load_path(path);
        }

        let css = grass::from_string(source, &options)
            .with_context(|| format!("compiling {:?}", record.path))?;

        let out_path = record.path.with_extension("css");
        Ok(Some(
            record.with_contents(css.into_bytes()).with_path(out_path),
        ))
    }
}
