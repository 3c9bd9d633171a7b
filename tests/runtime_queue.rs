// tests/runtime_queue.rs

//! Runtime loop semantics: runs are serialized, triggers arriving mid-run
//! queue behind the active run and coalesce, and the loop survives failed
//! runs.

use std::error::Error;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use assetflow::dag::Scheduler;
use assetflow::engine::{Runtime, RuntimeEvent, RuntimeOptions, TriggerQueue, TriggerReason};
use assetflow::registry::Registry;
use assetflow_test_utils::builders::ConfigBuilder;
use assetflow_test_utils::probe::WorkProbe;
use assetflow_test_utils::workspace::ProjectFixture;
use assetflow_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn trigger_queue_coalesces_duplicates() {
    let mut queue = TriggerQueue::new();
    assert!(queue.is_empty());

    queue.record_trigger("build");
    queue.record_trigger("build");
    queue.record_trigger("lint:scripts");

    let drained = queue.drain_pending();
    assert_eq!(drained, vec!["build", "lint:scripts"]);
    assert!(queue.is_empty());

    // Draining resets coalescing.
    queue.record_trigger("build");
    assert_eq!(queue.drain_pending(), vec!["build"]);
}

#[tokio::test]
async fn runtime_serializes_triggers_and_exits_when_idle() -> TestResult {
    init_tracing();

    let probe = WorkProbe::new();
    let mut registry = Registry::new();
    registry.register("solo", &[], probe.work("solo"))?;

    let scheduler = Scheduler::new(Arc::new(registry), None);
    let fixture = ProjectFixture::new();
    let ctx = fixture.context(ConfigBuilder::new().build());

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);

    // Two triggers land before the loop starts: the first begins a run, the
    // second queues behind it and produces exactly one follow-up run.
    for _ in 0..2 {
        tx.send(RuntimeEvent::TaskTriggered {
            task: "solo".to_string(),
            reason: TriggerReason::FileWatch,
        })
        .await?;
    }

    let runtime = Runtime::new(
        scheduler,
        ctx,
        rx,
        tx,
        None,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );

    timeout(Duration::from_secs(3), runtime.run()).await??;

    assert_eq!(probe.count_of("solo"), 2);

    Ok(())
}

#[tokio::test]
async fn runtime_survives_a_failed_run_and_retries_on_next_trigger() -> TestResult {
    init_tracing();

    let probe = WorkProbe::new();
    let mut registry = Registry::new();
    registry.register("flaky", &[], probe.failing_work("flaky"))?;
    registry.register("steady", &[], probe.work("steady"))?;

    let scheduler = Scheduler::new(Arc::new(registry), None);
    let fixture = ProjectFixture::new();
    let ctx = fixture.context(ConfigBuilder::new().build());

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);

    tx.send(RuntimeEvent::TaskTriggered {
        task: "flaky".to_string(),
        reason: TriggerReason::FileWatch,
    })
    .await?;
    tx.send(RuntimeEvent::TaskTriggered {
        task: "steady".to_string(),
        reason: TriggerReason::FileWatch,
    })
    .await?;

    let runtime = Runtime::new(
        scheduler,
        ctx,
        rx,
        tx,
        None,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );

    timeout(Duration::from_secs(3), runtime.run()).await??;

    assert_eq!(probe.count_of("flaky"), 1, "failed run executed once");
    assert_eq!(
        probe.count_of("steady"),
        1,
        "loop stays alive after a failure and serves the next trigger"
    );

    Ok(())
}

#[tokio::test]
async fn shutdown_event_stops_the_loop() -> TestResult {
    init_tracing();

    let probe = WorkProbe::new();
    let mut registry = Registry::new();
    registry.register("solo", &[], probe.work("solo"))?;

    let scheduler = Scheduler::new(Arc::new(registry), None);
    let fixture = ProjectFixture::new();
    let ctx = fixture.context(ConfigBuilder::new().build());

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
    tx.send(RuntimeEvent::ShutdownRequested).await?;

    let runtime = Runtime::new(scheduler, ctx, rx, tx, None, RuntimeOptions::default());
    timeout(Duration::from_secs(3), runtime.run()).await??;

    assert!(probe.executed().is_empty());

    Ok(())
}
