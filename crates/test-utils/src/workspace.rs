//! On-disk project fixtures for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetflow::cache::IncrementalCache;
use assetflow::config::Config;
use assetflow::registry::RunContext;
use tempfile::TempDir;

/// A temporary project directory with helpers for seeding sources and
/// inspecting build output.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("creating temp project"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file under the project root, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("creating fixture dirs");
        }
        fs::write(&path, contents).expect("writing fixture file");
        path
    }

    pub fn read(&self, rel: &str) -> Vec<u8> {
        fs::read(self.root().join(rel)).expect("reading fixture file")
    }

    pub fn read_string(&self, rel: &str) -> String {
        String::from_utf8(self.read(rel)).expect("fixture file is not UTF-8")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root().join(rel).exists()
    }

    /// Build a [`RunContext`] rooted at this fixture with a fresh in-memory
    /// cache.
    pub fn context(&self, config: Config) -> RunContext {
        RunContext {
            config: Arc::new(config),
            cache: Arc::new(IncrementalCache::memory()),
            project_root: self.root().to_path_buf(),
        }
    }

    /// Build a [`RunContext`] sharing a previously created cache, as the
    /// watch loop does across rebuilds.
    pub fn context_with_cache(&self, config: Config, cache: Arc<IncrementalCache>) -> RunContext {
        RunContext {
            config: Arc::new(config),
            cache,
            project_root: self.root().to_path_buf(),
        }
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}
