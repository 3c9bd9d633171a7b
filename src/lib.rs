// src/lib.rs

pub mod cache;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod serve;
pub mod stages;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::cache::IncrementalCache;
use crate::cli::{CliArgs, Command, EnvFlag};
use crate::config::{load_and_validate, Config};
use crate::dag::{plan, Scheduler};
use crate::engine::{Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::{AssetflowError, Result};
use crate::registry::{Registry, RunContext};
use crate::types::Environment;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the task registry and scheduler
/// - the incremental cache
/// - (for `watch`) the file watcher, dev server and runtime loop
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut config = load_and_validate(&config_path)?;

    if let Some(env) = effective_env(&args) {
        config = config.with_env(env);
    }

    let project_root = config_root_dir(&config_path);
    let config = Arc::new(config);

    let registry = Arc::new(tasks::build_registry(&config, &project_root)?);
    let cache = Arc::new(IncrementalCache::new(
        config.project.cache_store,
        &project_root,
    ));

    let ctx = RunContext {
        config: Arc::clone(&config),
        cache: Arc::clone(&cache),
        project_root: project_root.clone(),
    };

    let scheduler = Scheduler::new(Arc::clone(&registry), config.project.max_parallel);

    if args.dry_run {
        print_dry_run(&registry, &config, args.command.task_name())?;
        return Ok(());
    }

    match args.command {
        Command::Build | Command::LintScripts | Command::LintStyles => {
            let report = scheduler.run(args.command.task_name(), &ctx).await?;
            info!("{report}");
            Ok(())
        }
        Command::Clean => {
            scheduler.run("clean", &ctx).await?;
            cache.invalidate_all();
            info!("clean finished; cache cleared");
            Ok(())
        }
        Command::Watch => watch_mode(scheduler, ctx, &config, &project_root).await,
    }
}

/// Watch mode: build once, then rebuild on debounced file changes while
/// serving the output tree. A failed rebuild keeps the loop alive; the dev
/// server failing to bind keeps watching alive without serving.
async fn watch_mode(
    scheduler: Scheduler,
    ctx: RunContext,
    config: &Config,
    project_root: &Path,
) -> Result<()> {
    let serve_handle = match serve::start(
        project_root.join(&config.project.build_root),
        config.serve.port,
    ) {
        Ok(handle) => Some(handle),
        Err(AssetflowError::Bind(e)) => {
            error!(
                port = config.serve.port,
                "cannot bind dev server: {e}; watching continues without serving"
            );
            None
        }
        Err(e) => return Err(e),
    };
    let reload_tx = serve_handle.as_ref().map(|h| h.reload_tx.clone());

    let (event_tx, event_rx) = mpsc::channel::<RuntimeEvent>(64);

    let ignore_dirs: Vec<PathBuf> = config
        .project
        .generated_folders
        .iter()
        .map(PathBuf::from)
        .chain([
            PathBuf::from(&config.project.build_root),
            PathBuf::from(".assetflow"),
        ])
        .collect();

    let _watcher = watch::spawn_watcher(
        project_root,
        &config.watch.roots,
        Duration::from_millis(config.watch.debounce_ms),
        "build".to_string(),
        &ignore_dirs,
        event_tx.clone(),
    )?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // Seed the initial build.
    event_tx
        .send(RuntimeEvent::TaskTriggered {
            task: "build".to_string(),
            reason: TriggerReason::Manual,
        })
        .await
        .context("seeding initial build")?;

    let runtime = Runtime::new(
        scheduler,
        ctx,
        event_rx,
        event_tx,
        reload_tx,
        RuntimeOptions::default(),
    );
    runtime.run().await
}

/// CLI flag wins, then `ASSETFLOW_ENV`, then the config file value.
fn effective_env(args: &CliArgs) -> Option<Environment> {
    match args.env {
        Some(EnvFlag::Development) => Some(Environment::Development),
        Some(EnvFlag::Production) => Some(Environment::Production),
        None => std::env::var("ASSETFLOW_ENV")
            .ok()
            .and_then(|s| s.parse().ok()),
    }
}

/// Figure out the project root all patterns resolve against.
///
/// - If the config path has a non-empty parent (e.g. "configs/Assetflow.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetflow.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print the target's execution plan, each task's
/// prerequisites, and the effective environment.
fn print_dry_run(registry: &Registry, config: &Config, target: &str) -> Result<()> {
    let plan = plan::plan(registry, target)?;

    println!("assetflow dry-run");
    println!("  env = {:?}", config.project.env);
    println!("  build_root = {}", config.project.build_root);
    println!();

    println!("plan for '{target}' ({} tasks):", plan.len());
    for (depth, level) in plan.levels.iter().enumerate() {
        for name in level {
            let def = registry.get(name)?;
            if def.deps.is_empty() {
                println!("  [{depth}] {name}");
            } else {
                println!("  [{depth}] {name} (after: {})", def.deps.join(", "));
            }
        }
    }
    println!();

    println!("patterns:");
    let groups = [
        ("styles", &config.patterns.styles),
        ("scripts", &config.patterns.scripts),
        ("images", &config.patterns.images),
        ("icons", &config.patterns.icons),
        ("html", &config.patterns.html),
        ("vendor", &config.patterns.vendor),
    ];
    for (name, group) in groups {
        if group.is_empty() {
            continue;
        }
        println!("  {name}: {:?}", group.include);
        if !group.exclude.is_empty() {
            println!("    exclude: {:?}", group.exclude);
        }
    }

    Ok(())
}
