// src/pipeline/discover.rs

//! Glob-based file-set discovery.
//!
//! A [`FileSet`] compiles a [`PatternGroup`] into include and negation
//! globsets and walks the project root for matching files. Negation patterns
//! are always applied after inclusion. Discovery is restartable: every call
//! walks the filesystem afresh and yields records sorted by path.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::config::PatternGroup;
use crate::pipeline::record::FileRecord;

/// Compiled include/negation patterns for one pipeline's inputs.
#[derive(Clone)]
pub struct FileSet {
    include: GlobSet,
    exclude: Option<GlobSet>,
    // Kept for diagnostics and dry-run output.
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl fmt::Debug for FileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSet")
            .field("include", &self.include_patterns)
            .field("exclude", &self.exclude_patterns)
            .finish()
    }
}

impl FileSet {
    /// Compile a pattern group. Fails on any invalid glob.
    pub fn compile(group: &PatternGroup) -> Result<Self> {
        let include = build_globset(&group.include)
            .with_context(|| format!("building include globset from {:?}", group.include))?;

        let exclude = if group.exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&group.exclude)
                    .with_context(|| format!("building exclude globset from {:?}", group.exclude))?,
            )
        };

        Ok(Self {
            include,
            exclude,
            include_patterns: group.include.clone(),
            exclude_patterns: group.exclude.clone(),
        })
    }

    /// Whether a root-relative path (forward slashes) belongs to the set.
    /// Negations win over inclusions.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Walk `root` and read every matching file into a [`FileRecord`],
    /// sorted by path for deterministic downstream ordering.
    ///
    /// Dot-directories (`.git`, `.assetflow`, …) are never descended into.
    pub fn discover(&self, root: &Path) -> Result<Vec<FileRecord>> {
        let mut paths = Vec::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let entries = std::fs::read_dir(&dir)
                .with_context(|| format!("reading directory {dir:?}"))?;

            for entry in entries {
                let entry = entry?;
                let path = entry.path();
                let file_type = entry.file_type()?;

                if file_type.is_dir() {
                    let hidden = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with('.'));
                    if !hidden {
                        stack.push(path);
                    }
                } else if file_type.is_file() {
                    if let Ok(rel) = path.strip_prefix(root) {
                        let rel_str = rel.to_string_lossy().replace('\\', "/");
                        if self.matches(&rel_str) {
                            paths.push(rel.to_path_buf());
                        }
                    }
                }
            }
        }

        paths.sort();
        debug!(count = paths.len(), "discovered files");

        paths
            .into_iter()
            .map(|rel| {
                FileRecord::read(root, &rel).with_context(|| format!("reading source {rel:?}"))
            })
            .collect()
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.include_patterns
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
