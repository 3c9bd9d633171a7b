// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use notify::{EventKind, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TaskName, TriggerReason};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying debouncer (and its watcher) is kept
/// alive for as long as needed. Dropping this handle stops file watching.
pub struct WatcherHandle {
    _debouncer: notify_debouncer_full::Debouncer<
        notify::RecommendedWatcher,
        notify_debouncer_full::RecommendedCache,
    >,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a debounced filesystem watcher over `roots` (resolved against
/// `project_root`) that sends one `TaskTriggered` for `on_change_task` per
/// coalesced burst of create/modify/delete events.
///
/// Paths under `ignore_dirs` (the build output, generated sources and the
/// cache) never trigger: the pipeline writes into those trees itself and
/// must not retrigger its own runs.
pub fn spawn_watcher(
    project_root: &Path,
    roots: &[String],
    debounce: Duration,
    on_change_task: TaskName,
    ignore_dirs: &[PathBuf],
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let ignore: Vec<PathBuf> = ignore_dirs.iter().map(|d| project_root.join(d)).collect();

    // Bridge from the blocking debouncer callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<()>();

    let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
        match result {
            Ok(events) => {
                let relevant = events
                    .iter()
                    .filter(|de| {
                        matches!(
                            de.event.kind,
                            EventKind::Create(..) | EventKind::Modify(..) | EventKind::Remove(..)
                        )
                    })
                    .flat_map(|de| de.event.paths.iter())
                    .any(|path| !ignore.iter().any(|dir| path.starts_with(dir)));

                if relevant {
                    // One trigger per debounced batch; the queue coalesces
                    // further if a run is already active.
                    if event_tx.send(()).is_err() {
                        warn!("runtime gone; dropping file-change trigger");
                    }
                }
            }
            Err(errors) => {
                for e in errors {
                    warn!("file watch error: {e}");
                }
            }
        }
    })?;

    for root in roots {
        let path = project_root.join(root);
        if !path.exists() {
            debug!(?path, "watch root missing; skipping");
            continue;
        }
        debouncer.watch(&path, RecursiveMode::Recursive)?;
        info!(?path, "watching");
    }

    tokio::spawn(async move {
        while event_rx.recv().await.is_some() {
            let event = RuntimeEvent::TaskTriggered {
                task: on_change_task.clone(),
                reason: TriggerReason::FileWatch,
            };
            if runtime_tx.send(event).await.is_err() {
                break;
            }
        }
        debug!("watcher forwarding loop finished");
    });

    Ok(WatcherHandle {
        _debouncer: debouncer,
    })
}
