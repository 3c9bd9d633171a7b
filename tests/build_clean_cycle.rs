// tests/build_clean_cycle.rs

//! End-to-end: the standard task set over a real project layout, plus the
//! clean/build idempotence property.

use std::error::Error;
use std::io::Cursor;
use std::sync::Arc;

use tokio::time::{timeout, Duration};

use assetflow::cache::IncrementalCache;
use assetflow::dag::Scheduler;
use assetflow::tasks::build_registry;
use assetflow::types::Environment;
use assetflow_test_utils::builders::ConfigBuilder;
use assetflow_test_utils::workspace::ProjectFixture;
use assetflow_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

/// A tiny valid PNG, generated in-memory.
fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let mut img = image::RgbaImage::new(width, height);
    for pixel in img.pixels_mut() {
        *pixel = image::Rgba(rgba);
    }
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn seed_project(fixture: &ProjectFixture) {
    fixture.write("src/styles/main.scss", "$accent: #223344;\nbody { color: $accent; }\n");
    fixture.write("src/styles/_mixins.scss", "@mixin hidden { display: none; }\n");
    fixture.write("src/js/app.js", "function app() { return 1; }\n");
    fixture.write("src/js/util.js", "function util() { return 2; }\n");
    fixture.write(
        "src/index.html",
        "<html><head><!-- build:css --><link href=\"dev.css\"><!-- endbuild --></head></html>\n",
    );
    fixture.write("src/images/logo.png", png_bytes(4, 4, [10, 20, 30, 255]));
    fixture.write("src/images/icons/home.png", png_bytes(3, 2, [1, 2, 3, 255]));
    fixture.write("src/images/icons/user.png", png_bytes(2, 5, [4, 5, 6, 255]));
}

fn project_config() -> assetflow::config::Config {
    ConfigBuilder::new()
        .html_replace("css", "<link rel=\"stylesheet\" href=\"../css/styles.css\">")
        .build()
}

async fn run_task(fixture: &ProjectFixture, cache: &Arc<IncrementalCache>, task: &str) -> TestResult {
    let config = project_config();
    let registry = Arc::new(build_registry(&config, fixture.root())?);
    let scheduler = Scheduler::new(registry, None);
    let ctx = fixture.context_with_cache(config, Arc::clone(cache));

    timeout(Duration::from_secs(10), scheduler.run(task, &ctx)).await??;
    Ok(())
}

#[tokio::test]
async fn build_produces_the_full_output_tree() -> TestResult {
    init_tracing();

    let fixture = ProjectFixture::new();
    seed_project(&fixture);

    let cache = Arc::new(IncrementalCache::memory());
    run_task(&fixture, &cache, "build").await?;

    // Styles: compiled, concatenated, sprite variables included.
    let css = fixture.read_string("build/css/styles.css");
    assert!(css.contains("color: #223344"), "scss compiled: {css}");
    assert!(css.contains(".icon-home"), "sprite styles concatenated: {css}");

    // Sprite sheet generated as a source and copied into the image output.
    assert!(fixture.exists("src/images/generated/sprite.png"));
    assert!(fixture.exists("src/styles/generated/sprite.scss"));
    assert!(fixture.exists("build/images/generated/sprite.png"));

    // Images copied with the icon folder excluded.
    assert!(fixture.exists("build/images/logo.png"));
    assert!(!fixture.exists("build/images/icons/home.png"));

    // Bundle: both scripts, deterministic path order (app before util).
    let bundle = fixture.read_string("build/js/main.js");
    let app_pos = bundle.find("function app").expect("app in bundle");
    let util_pos = bundle.find("function util").expect("util in bundle");
    assert!(app_pos < util_pos);

    // HTML: marker block replaced.
    let html = fixture.read_string("build/html/index.html");
    assert!(html.contains("href=\"../css/styles.css\""));
    assert!(!html.contains("build:css"));

    Ok(())
}

#[tokio::test]
async fn clean_then_build_matches_a_cold_build() -> TestResult {
    init_tracing();

    let fixture = ProjectFixture::new();
    seed_project(&fixture);

    // Warm build with a populated cache.
    let cache = Arc::new(IncrementalCache::memory());
    run_task(&fixture, &cache, "build").await?;
    run_task(&fixture, &cache, "build").await?;

    // Explicit clean clears output and cache.
    run_task(&fixture, &cache, "clean").await?;
    cache.invalidate_all();
    assert!(!fixture.exists("build"));
    assert!(!fixture.exists("src/images/generated/sprite.png"));

    run_task(&fixture, &cache, "build").await?;
    let after_clean = fixture.read("build/css/styles.css");
    let after_clean_js = fixture.read("build/js/main.js");
    let after_clean_sprite = fixture.read("build/images/generated/sprite.png");

    // Cold build from an entirely fresh cache.
    run_task(&fixture, &Arc::new(IncrementalCache::memory()), "clean").await?;
    run_task(&fixture, &Arc::new(IncrementalCache::memory()), "build").await?;

    assert_eq!(fixture.read("build/css/styles.css"), after_clean);
    assert_eq!(fixture.read("build/js/main.js"), after_clean_js);
    assert_eq!(
        fixture.read("build/images/generated/sprite.png"),
        after_clean_sprite
    );

    Ok(())
}

#[tokio::test]
async fn production_build_minifies_styles_and_scripts() -> TestResult {
    init_tracing();

    let fixture = ProjectFixture::new();
    seed_project(&fixture);
    fixture.write(
        "src/js/comments.js",
        "// a comment\nfunction real() { return 3; } /* block */\n",
    );

    let config = ConfigBuilder::new()
        .env(Environment::Production)
        .html_replace("css", "<link rel=\"stylesheet\" href=\"../css/styles.css\">")
        .build();
    let registry = Arc::new(build_registry(&config, fixture.root())?);
    let scheduler = Scheduler::new(registry, None);
    let ctx = fixture.context(config);

    timeout(Duration::from_secs(10), scheduler.run("build", &ctx)).await??;

    let css = fixture.read_string("build/css/styles.css");
    assert!(!css.contains('\n'), "production css is collapsed: {css:?}");

    let bundle = fixture.read_string("build/js/main.js");
    assert!(!bundle.contains("// a comment"));
    assert!(!bundle.contains("/* block */"));
    assert!(bundle.contains("function real()"));

    Ok(())
}

#[tokio::test]
async fn lint_tasks_fail_on_matching_rules_and_pass_otherwise() -> TestResult {
    init_tracing();

    let fixture = ProjectFixture::new();
    fixture.write("src/js/app.js", "function app() { debugger; }\n");
    fixture.write("src/styles/main.scss", "body { color: red; }\n");

    let config = ConfigBuilder::new()
        .script_lint_rule("no-debugger", r"\bdebugger\b")
        .style_lint_rule("no-important", r"!important")
        .build();
    let registry = Arc::new(build_registry(&config, fixture.root())?);
    let scheduler = Scheduler::new(registry, None);
    let ctx = fixture.context(config);

    let scripts = timeout(Duration::from_secs(5), scheduler.run("lint:scripts", &ctx)).await?;
    assert!(scripts.is_err(), "debugger statement must fail lint");

    let styles = timeout(Duration::from_secs(5), scheduler.run("lint:styles", &ctx)).await?;
    assert!(styles.is_ok(), "clean styles must pass lint");

    Ok(())
}
