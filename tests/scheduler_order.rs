// tests/scheduler_order.rs

use std::error::Error;
use std::sync::Arc;

use tokio::time::{timeout, Duration};

use assetflow::dag::{plan, Scheduler};
use assetflow::registry::Registry;
use assetflow_test_utils::builders::ConfigBuilder;
use assetflow_test_utils::probe::WorkProbe;
use assetflow_test_utils::workspace::ProjectFixture;
use assetflow_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

/// Diamond: A, B(A), C(A), D(B, C).
fn diamond_registry(probe: &WorkProbe) -> Registry {
    let mut registry = Registry::new();
    registry.register("A", &[], probe.work("A")).unwrap();
    registry.register("B", &["A"], probe.work("B")).unwrap();
    registry.register("C", &["A"], probe.work("C")).unwrap();
    registry.register("D", &["B", "C"], probe.work("D")).unwrap();
    registry
}

#[tokio::test]
async fn diamond_runs_each_task_exactly_once_in_dependency_order() -> TestResult {
    init_tracing();

    let probe = WorkProbe::new();
    let registry = Arc::new(diamond_registry(&probe));
    let scheduler = Scheduler::new(registry, None);

    let fixture = ProjectFixture::new();
    let ctx = fixture.context(ConfigBuilder::new().build());

    let report = timeout(Duration::from_secs(3), scheduler.run("D", &ctx)).await??;

    assert_eq!(report.completed, vec!["A", "B", "C", "D"]);
    assert!(report.failed.is_empty());
    assert!(report.skipped.is_empty());

    let executed = probe.executed();
    assert_eq!(executed.len(), 4, "each task runs exactly once");
    for name in ["A", "B", "C", "D"] {
        assert_eq!(probe.count_of(name), 1, "{name} must run exactly once");
    }

    // A strictly first, D strictly last; B and C in either order between.
    let pos = |name: &str| executed.iter().position(|n| n == name).unwrap();
    assert_eq!(pos("A"), 0);
    assert_eq!(pos("D"), 3);

    Ok(())
}

#[tokio::test]
async fn running_a_leaf_skips_unrelated_tasks() -> TestResult {
    init_tracing();

    let probe = WorkProbe::new();
    let registry = Arc::new(diamond_registry(&probe));
    let scheduler = Scheduler::new(registry, None);

    let fixture = ProjectFixture::new();
    let ctx = fixture.context(ConfigBuilder::new().build());

    let report = timeout(Duration::from_secs(3), scheduler.run("B", &ctx)).await??;

    assert_eq!(report.completed, vec!["A", "B"]);
    assert_eq!(probe.count_of("C"), 0);
    assert_eq!(probe.count_of("D"), 0);

    Ok(())
}

#[test]
fn plan_orders_every_task_after_its_prerequisites() {
    let probe = WorkProbe::new();
    let registry = diamond_registry(&probe);

    let plan = plan::plan(&registry, "D").unwrap();
    let order: Vec<&str> = plan.ordered().collect();

    let pos = |name: &str| order.iter().position(|n| *n == name).unwrap();
    assert!(pos("A") < pos("B"));
    assert!(pos("A") < pos("C"));
    assert!(pos("B") < pos("D"));
    assert!(pos("C") < pos("D"));
}

#[test]
fn plan_breaks_ties_by_registration_order() {
    let probe = WorkProbe::new();
    let mut registry = Registry::new();

    // Three independent tasks registered out of alphabetical order, plus a
    // target depending on all of them.
    registry.register("gamma", &[], probe.work("gamma")).unwrap();
    registry.register("alpha", &[], probe.work("alpha")).unwrap();
    registry.register("beta", &[], probe.work("beta")).unwrap();
    registry
        .register("all", &["gamma", "alpha", "beta"], probe.work("all"))
        .unwrap();

    let plan = plan::plan(&registry, "all").unwrap();

    assert_eq!(plan.levels.len(), 2);
    assert_eq!(plan.levels[0], vec!["gamma", "alpha", "beta"]);
    assert_eq!(plan.levels[1], vec!["all"]);
}

#[test]
fn plan_resolves_only_the_transitive_closure() {
    let probe = WorkProbe::new();
    let mut registry = Registry::new();
    registry.register("wanted", &[], probe.work("wanted")).unwrap();
    registry.register("unrelated", &[], probe.work("unrelated")).unwrap();

    let plan = plan::plan(&registry, "wanted").unwrap();
    let order: Vec<&str> = plan.ordered().collect();

    assert_eq!(order, vec!["wanted"]);
}
