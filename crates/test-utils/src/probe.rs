//! Recording probes: task works and pipeline stages that log every
//! invocation, so tests can assert execution order and recomputation counts
//! without real transforms.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assetflow::pipeline::{FileRecord, Stage};
use assetflow::registry::RunContext;

/// Records the order in which task works execute.
#[derive(Clone, Default)]
pub struct WorkProbe {
    executed: Arc<Mutex<Vec<String>>>,
}

impl WorkProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// A work unit that records its task name and succeeds.
    pub fn work(
        &self,
        name: &str,
    ) -> impl Fn(&RunContext) -> anyhow::Result<()> + Send + Sync + 'static {
        let executed = Arc::clone(&self.executed);
        let name = name.to_string();
        move |_ctx| {
            executed.lock().unwrap().push(name.clone());
            Ok(())
        }
    }

    /// A work unit that records its task name and fails.
    pub fn failing_work(
        &self,
        name: &str,
    ) -> impl Fn(&RunContext) -> anyhow::Result<()> + Send + Sync + 'static {
        let executed = Arc::clone(&self.executed);
        let name = name.to_string();
        move |_ctx| {
            executed.lock().unwrap().push(name.clone());
            anyhow::bail!("{name} failed")
        }
    }

    /// Everything executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// How many times `name` executed.
    pub fn count_of(&self, name: &str) -> usize {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.as_str() == name)
            .count()
    }
}

/// A per-record stage that uppercases contents and counts its invocations.
/// Used to verify that the incremental cache short-circuits recomputation.
pub struct CountingStage {
    invocations: Arc<AtomicUsize>,
}

impl CountingStage {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let invocations = Arc::new(AtomicUsize::new(0));
        (
            Self {
                invocations: Arc::clone(&invocations),
            },
            invocations,
        )
    }
}

impl Stage for CountingStage {
    fn name(&self) -> &str {
        "counting"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let upper = record.text()?.to_uppercase();
        Ok(Some(record.with_contents(upper.into_bytes())))
    }
}

/// A per-record stage that fails on records whose file name matches.
pub struct FailOnStage {
    needle: String,
}

impl FailOnStage {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_string(),
        }
    }
}

impl Stage for FailOnStage {
    fn name(&self) -> &str {
        "fail-on"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        let name = record
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if name == self.needle {
            anyhow::bail!("refusing to process {name}");
        }
        Ok(Some(record))
    }
}
