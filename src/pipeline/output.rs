// src/pipeline/output.rs

//! The Build Output Tree: where a pipeline run lands its records.
//!
//! In [`WriteMode::Replace`] the destination is owned wholesale by the run:
//! records are written into a staging directory first and swapped into place
//! only when the whole run succeeded, so a failed run leaves the previous
//! tree intact and two runs never interleave partial output.
//!
//! [`WriteMode::Overlay`] writes individual files into an existing tree
//! without claiming ownership of it; it is used for generated sources that
//! live next to hand-written ones. Overlay writes are skipped when the
//! on-disk contents already match, so regenerating identical output does not
//! touch modification times (and therefore does not re-trigger the watcher).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::pipeline::record::FileRecord;

/// How records are committed to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Wipe-and-swap: the destination is replaced atomically per run.
    Replace,
    /// Write files into the destination without clearing it.
    Overlay,
}

/// Destination specification for one pipeline.
#[derive(Debug, Clone)]
pub struct OutputSpec {
    /// Destination directory, relative to the project root.
    pub dest: PathBuf,
    pub mode: WriteMode,
}

impl OutputSpec {
    pub fn replace(dest: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            mode: WriteMode::Replace,
        }
    }

    pub fn overlay(dest: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            mode: WriteMode::Overlay,
        }
    }
}

/// Staging area used by `Replace` mode before the swap.
const STAGING_DIR: &str = ".assetflow/staging";

/// Write all records according to the spec. Returns the destination-relative
/// paths written.
pub fn write_records(
    project_root: &Path,
    task: &str,
    spec: &OutputSpec,
    records: &[FileRecord],
) -> Result<Vec<PathBuf>> {
    match spec.mode {
        WriteMode::Replace => write_replace(project_root, task, &spec.dest, records),
        WriteMode::Overlay => write_overlay(project_root, &spec.dest, records),
    }
}

fn write_replace(
    project_root: &Path,
    task: &str,
    dest: &Path,
    records: &[FileRecord],
) -> Result<Vec<PathBuf>> {
    let staging = project_root.join(STAGING_DIR).join(sanitize(task));
    let final_dir = project_root.join(dest);

    if staging.exists() {
        fs::remove_dir_all(&staging)
            .with_context(|| format!("clearing stale staging dir {staging:?}"))?;
    }
    fs::create_dir_all(&staging).with_context(|| format!("creating staging dir {staging:?}"))?;

    let mut written = Vec::with_capacity(records.len());
    for record in records {
        let target = staging.join(&record.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &record.contents)
            .with_context(|| format!("writing {:?}", record.path))?;
        written.push(record.path.clone());
    }

    // Swap: the previous tree disappears only after the new one is complete.
    if final_dir.exists() {
        fs::remove_dir_all(&final_dir)
            .with_context(|| format!("removing previous output {final_dir:?}"))?;
    }
    if let Some(parent) = final_dir.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(&staging, &final_dir) {
        Ok(()) => {}
        Err(_) => {
            // Cross-device fallback.
            copy_tree(&staging, &final_dir)?;
            fs::remove_dir_all(&staging).ok();
        }
    }

    debug!(task = %task, files = written.len(), dest = ?final_dir, "output tree swapped");
    Ok(written)
}

fn write_overlay(project_root: &Path, dest: &Path, records: &[FileRecord]) -> Result<Vec<PathBuf>> {
    let base = project_root.join(dest);
    let mut written = Vec::with_capacity(records.len());

    for record in records {
        let target = base.join(&record.path);

        if let Ok(existing) = fs::read(&target) {
            if existing == record.contents {
                continue;
            }
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &record.contents)
            .with_context(|| format!("writing {:?}", record.path))?;
        written.push(record.path.clone());
    }

    Ok(written)
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn sanitize(task: &str) -> String {
    task.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
