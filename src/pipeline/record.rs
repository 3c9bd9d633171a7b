// src/pipeline/record.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::Signature;

/// A file flowing through a pipeline: its path (project-relative on input,
/// output-relative after rebasing), its contents, a content signature, and an
/// optional association with the source file it was derived from.
///
/// Records are created per pipeline invocation and discarded after the run;
/// only cached outputs persist across runs. Stages return new records (or
/// drop them) rather than mutating shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub contents: Vec<u8>,
    pub signature: Signature,
    /// Source path this record was derived from, when a transform changed
    /// its representation (e.g. compiled styles remember the input file).
    pub source_map: Option<PathBuf>,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        let signature = Signature::of_bytes(&contents);
        Self {
            path: path.into(),
            contents,
            signature,
            source_map: None,
        }
    }

    /// Read a record from disk. `rel` is kept as the record path; contents
    /// are read from `root.join(rel)`.
    pub fn read(root: &Path, rel: impl Into<PathBuf>) -> std::io::Result<Self> {
        let rel = rel.into();
        let contents = fs::read(root.join(&rel))?;
        Ok(Self::new(rel, contents))
    }

    /// Replace the contents, recomputing the signature and remembering the
    /// previous path as the source association.
    pub fn with_contents(self, contents: Vec<u8>) -> Self {
        let signature = Signature::of_bytes(&contents);
        Self {
            source_map: self.source_map.clone().or(Some(self.path.clone())),
            path: self.path,
            contents,
            signature,
        }
    }

    /// Replace the record path, keeping contents and provenance.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> anyhow::Result<&str> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| anyhow::anyhow!("{:?} is not valid UTF-8: {e}", self.path))
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }
}
