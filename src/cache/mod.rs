// src/cache/mod.rs

//! Incremental per-file transform cache.
//!
//! Entries are keyed by (task identity, input path, content signature) and
//! hold the last-known output record for that input. An unchanged input
//! reuses its cached output without invoking any transform; a changed input
//! misses and is recomputed, updating the entry. Scopes are partitioned per
//! task so identical paths used by different tasks never collide.

pub mod signature;
pub mod store;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

pub use signature::Signature;
pub use store::{CacheStore, DiskStore, MemoryStore, CACHE_DIR};

use crate::pipeline::FileRecord;
use crate::types::CacheStoreMode;

/// The cache shared across runs. Concurrent reads are safe; writes to the
/// same key are serialized by the backing store (last-writer-wins, which is
/// sound because matching keys imply identical inputs).
pub struct IncrementalCache {
    store: Box<dyn CacheStore>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl IncrementalCache {
    pub fn new(mode: CacheStoreMode, project_root: &Path) -> Self {
        let store: Box<dyn CacheStore> = match mode {
            CacheStoreMode::Memory => Box::new(MemoryStore::new()),
            CacheStoreMode::Disk => Box::new(DiskStore::new(project_root)),
        };
        Self::with_store(store)
    }

    pub fn memory() -> Self {
        Self::with_store(Box::new(MemoryStore::new()))
    }

    pub fn with_store(store: Box<dyn CacheStore>) -> Self {
        Self {
            store,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up the cached output for `(task, input, signature)`.
    ///
    /// Store errors are treated as misses: a broken cache degrades to
    /// recomputation, never to a failed build.
    pub fn get(&self, task: &str, input: &Path, signature: &Signature) -> Option<FileRecord> {
        match self.store.load(task, input, signature) {
            Ok(Some(record)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(task = %task, input = ?input, "cache hit");
                Some(record)
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                warn!(task = %task, input = ?input, "cache load failed: {e:#}");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Record the output for `(task, input, signature)`.
    pub fn put(&self, task: &str, input: &Path, signature: &Signature, output: &FileRecord) {
        if let Err(e) = self.store.save(task, input, signature, output) {
            warn!(task = %task, input = ?input, "cache save failed: {e:#}");
        }
    }

    /// Drop every entry scoped to the given task.
    pub fn invalidate_scope(&self, task: &str) {
        if let Err(e) = self.store.clear_scope(task) {
            warn!(task = %task, "cache invalidation failed: {e:#}");
        }
    }

    /// Drop every entry; used by the explicit clean operation.
    pub fn invalidate_all(&self) {
        if let Err(e) = self.store.clear_all() {
            warn!("cache invalidation failed: {e:#}");
        }
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for IncrementalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalCache")
            .field("hits", &self.hit_count())
            .field("misses", &self.miss_count())
            .finish_non_exhaustive()
    }
}
