// tests/discover_globs.rs

use std::error::Error;
use std::path::PathBuf;

use assetflow::config::PatternGroup;
use assetflow::pipeline::FileSet;
use assetflow_test_utils::workspace::ProjectFixture;
use assetflow_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn exclusion_applies_after_inclusion() -> TestResult {
    init_tracing();

    let fixture = ProjectFixture::new();
    fixture.write("a.png", "png-a");
    fixture.write("icons/b.png", "png-b");
    fixture.write("c.svg", "svg-c");

    let group = PatternGroup::new(vec!["**/*.png"], vec!["icons/**"]);
    let fileset = FileSet::compile(&group)?;

    let records = fileset.discover(fixture.root())?;
    let paths: Vec<PathBuf> = records.into_iter().map(|r| r.path).collect();

    assert_eq!(paths, vec![PathBuf::from("a.png")]);

    Ok(())
}

#[test]
fn discovery_is_restartable_and_sorted() -> TestResult {
    init_tracing();

    let fixture = ProjectFixture::new();
    fixture.write("src/js/z.js", "z");
    fixture.write("src/js/a.js", "a");
    fixture.write("src/js/nested/m.js", "m");

    let group = PatternGroup::new(vec!["src/js/**/*.js"], vec![]);
    let fileset = FileSet::compile(&group)?;

    let first: Vec<PathBuf> = fileset
        .discover(fixture.root())?
        .into_iter()
        .map(|r| r.path)
        .collect();
    assert_eq!(
        first,
        vec![
            PathBuf::from("src/js/a.js"),
            PathBuf::from("src/js/nested/m.js"),
            PathBuf::from("src/js/z.js"),
        ]
    );

    // A second discovery sees new files; nothing is memoized.
    fixture.write("src/js/b.js", "b");
    let second = fileset.discover(fixture.root())?;
    assert_eq!(second.len(), 4);

    Ok(())
}

#[test]
fn dot_directories_are_never_discovered() -> TestResult {
    init_tracing();

    let fixture = ProjectFixture::new();
    fixture.write("src/a.txt", "a");
    fixture.write(".assetflow/cache/src/b.txt", "b");

    let group = PatternGroup::new(vec!["**/*.txt"], vec![]);
    let fileset = FileSet::compile(&group)?;

    let records = fileset.discover(fixture.root())?;
    let paths: Vec<PathBuf> = records.into_iter().map(|r| r.path).collect();

    assert_eq!(paths, vec![PathBuf::from("src/a.txt")]);

    Ok(())
}

#[test]
fn matches_respects_both_sets() -> TestResult {
    let group = PatternGroup::new(
        vec!["src/images/**/*.png", "src/images/**/*.svg"],
        vec!["src/images/icons/**"],
    );
    let fileset = FileSet::compile(&group)?;

    assert!(fileset.matches("src/images/logo.png"));
    assert!(fileset.matches("src/images/generated/sprite.png"));
    assert!(!fileset.matches("src/images/icons/home.png"));
    assert!(!fileset.matches("src/js/main.js"));

    Ok(())
}

#[test]
fn invalid_pattern_fails_compilation() {
    let group = PatternGroup::new(vec!["src/[unclosed"], vec![]);
    assert!(FileSet::compile(&group).is_err());
}
