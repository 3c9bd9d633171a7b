// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::dag::Scheduler;
use crate::errors::Result;
use crate::registry::RunContext;

use super::queue::TriggerQueue;
use super::{RuntimeEvent, RuntimeOptions, TaskName};

/// The watch-mode event loop.
///
/// Consumes [`RuntimeEvent`]s, serializes scheduler runs (at most one in
/// flight; triggers arriving mid-run queue behind it) and pushes a reload
/// notification after each successful run. A failed run is reported and the
/// loop stays alive: the next file-change event retriggers automatically
/// with no manual restart.
pub struct Runtime {
    scheduler: Scheduler,
    ctx: RunContext,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    event_tx: mpsc::Sender<RuntimeEvent>,
    queue: TriggerQueue,
    options: RuntimeOptions,
    /// Fire-and-forget reload push; `None` when serving is unavailable.
    reload_tx: Option<std::sync::mpsc::Sender<()>>,
    running: Option<TaskName>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("running", &self.running)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        scheduler: Scheduler,
        ctx: RunContext,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        event_tx: mpsc::Sender<RuntimeEvent>,
        reload_tx: Option<std::sync::mpsc::Sender<()>>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            scheduler,
            ctx,
            event_rx,
            event_tx,
            queue: TriggerQueue::new(),
            options,
            reload_tx,
            running: None,
        }
    }

    /// Main event loop; returns when the channel closes, shutdown is
    /// requested, or (with `exit_when_idle`) everything has drained.
    pub async fn run(mut self) -> Result<()> {
        info!("assetflow runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            match event {
                RuntimeEvent::TaskTriggered { task, reason } => {
                    if self.running.is_some() {
                        debug!(task = %task, ?reason, "run active; queueing trigger");
                        self.queue.record_trigger(&task);
                    } else {
                        self.start_run(task);
                    }
                }
                RuntimeEvent::RunCompleted { task, success } => {
                    self.running = None;

                    if success {
                        self.notify_reload();
                    } else {
                        info!(task = %task, "run failed; waiting for next change");
                    }

                    let mut drained = self.queue.drain_pending().into_iter();
                    match drained.next() {
                        Some(next) => {
                            for rest in drained {
                                self.queue.record_trigger(&rest);
                            }
                            self.start_run(next);
                        }
                        None if self.options.exit_when_idle => {
                            info!("idle with empty queue; exiting runtime");
                            break;
                        }
                        None => {}
                    }
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested; stopping runtime");
                    break;
                }
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    fn start_run(&mut self, task: TaskName) {
        self.running = Some(task.clone());

        let scheduler = self.scheduler.clone();
        let ctx = self.ctx.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = scheduler.run(&task, &ctx).await;
            let success = match &result {
                Ok(report) => {
                    info!("{report}");
                    true
                }
                Err(e) => {
                    error!("run of '{task}' failed: {e}");
                    false
                }
            };

            let _ = tx
                .send(RuntimeEvent::RunCompleted { task, success })
                .await;
        });
    }

    /// Reload pushes must never block the loop; a full or disconnected
    /// channel is simply dropped.
    fn notify_reload(&self) {
        if let Some(tx) = &self.reload_tx {
            let _ = tx.send(());
        }
    }
}
