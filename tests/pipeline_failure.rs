// tests/pipeline_failure.rs

//! Stage failures abort only the owning task's pipeline and its dependents;
//! independent siblings complete.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::time::{timeout, Duration};

use assetflow::config::PatternGroup;
use assetflow::dag::Scheduler;
use assetflow::errors::AssetflowError;
use assetflow::pipeline::{FileSet, OutputSpec, Pipeline, RunState, Stage};
use assetflow::registry::Registry;
use assetflow_test_utils::builders::ConfigBuilder;
use assetflow_test_utils::probe::{FailOnStage, WorkProbe};
use assetflow_test_utils::workspace::ProjectFixture;
use assetflow_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn css_pipeline(task: &str) -> Pipeline {
    let fileset = FileSet::compile(&PatternGroup::new(vec!["src/**/*.css"], vec![])).unwrap();
    let stages: Vec<Box<dyn Stage>> = vec![Box::new(FailOnStage::new("broken.css"))];
    Pipeline::new(task, fileset, stages, OutputSpec::replace("build/css"))
}

#[test]
fn stage_failure_names_stage_and_record() {
    init_tracing();

    let fixture = ProjectFixture::new();
    fixture.write("src/ok.css", "body {}");
    fixture.write("src/broken.css", "nope");

    let ctx = fixture.context(ConfigBuilder::new().build());
    let err = css_pipeline("styles").run(&ctx).unwrap_err();

    assert_eq!(err.stage, "fail-on");
    assert_eq!(err.record, Some(PathBuf::from("src/broken.css")));
}

#[test]
fn successful_run_walks_the_full_state_machine() -> TestResult {
    init_tracing();

    let fixture = ProjectFixture::new();
    fixture.write("src/ok.css", "body {}");

    let ctx = fixture.context(ConfigBuilder::new().build());
    let report = css_pipeline("styles").run(&ctx)?;

    assert_eq!(
        report.states,
        vec![
            RunState::Idle,
            RunState::Discovering,
            RunState::Transforming,
            RunState::Writing,
            RunState::Complete,
        ]
    );

    Ok(())
}

#[tokio::test]
async fn failing_task_skips_dependents_but_not_siblings() -> TestResult {
    init_tracing();

    let fixture = ProjectFixture::new();
    fixture.write("src/ok.css", "body {}");
    fixture.write("src/broken.css", "nope");

    let probe = WorkProbe::new();
    let mut registry = Registry::new();

    let bad = Arc::new(css_pipeline("bad"));
    registry.register("bad", &[], move |ctx| {
        bad.run(ctx)?;
        Ok(())
    })?;
    registry.register("sibling", &[], probe.work("sibling"))?;
    registry.register("dependent", &["bad"], probe.work("dependent"))?;
    registry.register(
        "all",
        &["bad", "sibling", "dependent"],
        probe.work("all"),
    )?;

    let scheduler = Scheduler::new(Arc::new(registry), None);
    let ctx = fixture.context(ConfigBuilder::new().build());

    let result = timeout(Duration::from_secs(3), scheduler.run("all", &ctx)).await?;

    let report = match result {
        Err(AssetflowError::PartialFailure(report)) => report,
        other => panic!("expected PartialFailure, got {other:?}"),
    };

    assert_eq!(report.failed, vec!["bad"]);
    assert_eq!(report.completed, vec!["sibling"]);
    assert_eq!(report.skipped, vec!["all", "dependent"]);

    assert_eq!(probe.count_of("sibling"), 1, "independent sibling completes");
    assert_eq!(probe.count_of("dependent"), 0, "dependent never starts");
    assert_eq!(probe.count_of("all"), 0);

    Ok(())
}

#[tokio::test]
async fn failed_run_leaves_previous_output_intact() -> TestResult {
    init_tracing();

    let fixture = ProjectFixture::new();
    fixture.write("src/ok.css", "body {}");

    let ctx = fixture.context(ConfigBuilder::new().build());

    css_pipeline("styles").run(&ctx)?;
    assert!(fixture.exists("build/css/src/ok.css"));
    let before = fixture.read("build/css/src/ok.css");

    // Introduce a poisoned record; the rerun fails mid-transform.
    fixture.write("src/broken.css", "nope");
    assert!(css_pipeline("styles").run(&ctx).is_err());

    assert_eq!(
        fixture.read("build/css/src/ok.css"),
        before,
        "failed run must not disturb the previous output tree"
    );

    Ok(())
}
