// src/cache/store.rs

//! Pluggable persistence for cache entries.
//!
//! `MemoryStore` keeps entries for the process lifetime; `DiskStore`
//! persists them under `.assetflow/cache` so consecutive invocations stay
//! incremental. Both serialize writes behind a lock; reads on the memory
//! store are concurrent.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use tracing::debug;

use crate::cache::signature::Signature;
use crate::engine::TaskName;
use crate::pipeline::FileRecord;

/// Relative path (from the project root) to the disk cache.
pub const CACHE_DIR: &str = ".assetflow/cache";

/// Abstract storage for cache entries, keyed by (task scope, input path).
///
/// A stored entry is only valid for the exact signature it was saved with;
/// `load` must return `None` on any mismatch.
pub trait CacheStore: Send + Sync {
    fn load(&self, task: &str, input: &Path, signature: &Signature) -> Result<Option<FileRecord>>;

    fn save(
        &self,
        task: &str,
        input: &Path,
        signature: &Signature,
        output: &FileRecord,
    ) -> Result<()>;

    /// Remove every entry stored under the given task scope.
    fn clear_scope(&self, task: &str) -> Result<()>;

    /// Remove every entry in the store.
    fn clear_all(&self) -> Result<()>;
}

type ScopeMap = HashMap<PathBuf, (Signature, FileRecord)>;

/// Keeps entries in memory only (lost on restart).
#[derive(Default)]
pub struct MemoryStore {
    scopes: RwLock<HashMap<TaskName, ScopeMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, task: &str, input: &Path, signature: &Signature) -> Result<Option<FileRecord>> {
        let scopes = self.scopes.read().expect("cache lock poisoned");
        Ok(scopes.get(task).and_then(|scope| {
            scope
                .get(input)
                .filter(|(sig, _)| sig == signature)
                .map(|(_, record)| record.clone())
        }))
    }

    fn save(
        &self,
        task: &str,
        input: &Path,
        signature: &Signature,
        output: &FileRecord,
    ) -> Result<()> {
        let mut scopes = self.scopes.write().expect("cache lock poisoned");
        scopes
            .entry(task.to_string())
            .or_default()
            .insert(input.to_path_buf(), (*signature, output.clone()));
        Ok(())
    }

    fn clear_scope(&self, task: &str) -> Result<()> {
        let mut scopes = self.scopes.write().expect("cache lock poisoned");
        scopes.remove(task);
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        let mut scopes = self.scopes.write().expect("cache lock poisoned");
        scopes.clear();
        Ok(())
    }
}

/// Persists entries under `<root>/.assetflow/cache/<scope>/<key>`.
///
/// The entry file layout is a single header line holding the output-relative
/// path, followed by the raw output bytes. The entry key encodes the input
/// path hash and the input signature, so a signature change naturally misses
/// and the stale entry is overwritten on the next save.
pub struct DiskStore {
    root: PathBuf,
    // Serializes writers; the on-disk layout itself is read-concurrent.
    write_lock: RwLock<()>,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: RwLock::new(()),
        }
    }

    fn scope_dir(&self, task: &str) -> PathBuf {
        // Task names may contain separators (`lint:scripts`); keep the
        // directory name filesystem-safe.
        let safe: String = task
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(CACHE_DIR).join(safe)
    }

    fn entry_path(&self, task: &str, input: &Path, signature: &Signature) -> PathBuf {
        let key = Signature::of_bytes(input.to_string_lossy().as_bytes());
        self.scope_dir(task)
            .join(format!("{}-{}", key.to_hex(), signature.to_hex()))
    }
}

impl CacheStore for DiskStore {
    fn load(&self, task: &str, input: &Path, signature: &Signature) -> Result<Option<FileRecord>> {
        let _guard = self.write_lock.read().expect("cache lock poisoned");
        let path = self.entry_path(task, input, signature);

        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read(&path).with_context(|| format!("reading cache entry {path:?}"))?;
        let Some(split) = data.iter().position(|&b| b == b'\n') else {
            debug!(?path, "malformed cache entry; treating as miss");
            return Ok(None);
        };

        let header = String::from_utf8_lossy(&data[..split]).to_string();
        let contents = data[split + 1..].to_vec();

        Ok(Some(FileRecord::new(PathBuf::from(header), contents)))
    }

    fn save(
        &self,
        task: &str,
        input: &Path,
        signature: &Signature,
        output: &FileRecord,
    ) -> Result<()> {
        let _guard = self.write_lock.write().expect("cache lock poisoned");
        let path = self.entry_path(task, input, signature);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {parent:?}"))?;
        }

        let mut data = output.path.to_string_lossy().into_owned().into_bytes();
        data.push(b'\n');
        data.extend_from_slice(&output.contents);

        fs::write(&path, data).with_context(|| format!("writing cache entry {path:?}"))?;
        Ok(())
    }

    fn clear_scope(&self, task: &str) -> Result<()> {
        let _guard = self.write_lock.write().expect("cache lock poisoned");
        let dir = self.scope_dir(task);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("clearing cache scope {dir:?}")),
        }
    }

    fn clear_all(&self) -> Result<()> {
        let _guard = self.write_lock.write().expect("cache lock poisoned");
        let dir = self.root.join(CACHE_DIR);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("clearing cache at {dir:?}")),
        }
    }
}
