// src/tasks.rs

//! Assembles the standard asset-pipeline task set into a [`Registry`].
//!
//! Dependency shape:
//!
//! ```text
//! clean ─┬─ vendor ─┬─ styles ──┐
//!        ├─ sprite ─┤           │
//!        │          ├─ images ──┼─ build
//!        ├──────────┴─ bundle ──┤
//!        └─ html ───────────────┘
//! ```
//!
//! `lint:scripts` and `lint:styles` stand alone; they verify sources and
//! write nothing.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::errors::Result;
use crate::pipeline::{FileSet, OutputSpec, Pipeline, Stage};
use crate::registry::{Registry, RunContext};
use crate::stages::{
    ConcatStage, CssMinifyStage, CssPrefixStage, FilterStage, HtmlReplaceStage, ImageOptStage,
    JsMinifyStage, LintStage, RebaseStage, ScssStage, SpriteStage,
};

/// File types the vendor staging keeps.
const VENDOR_ASSETS: &[&str] = &[
    "**/*.css", "**/*.js", "**/*.scss", "**/*.png", "**/*.svg", "**/*.woff", "**/*.woff2",
    "**/*.ttf", "**/*.eot",
];

/// Build the registry of standard tasks for the given configuration.
pub fn build_registry(config: &Config, project_root: &Path) -> Result<Registry> {
    let mut registry = Registry::new();
    let production = config.project.env.is_production();

    // clean: delete build output, generated sources and stale staging.
    {
        let build_root = PathBuf::from(&config.project.build_root);
        let generated: Vec<PathBuf> = config
            .project
            .generated_folders
            .iter()
            .map(PathBuf::from)
            .collect();

        registry.register("clean", &[], move |ctx: &RunContext| {
            remove_tree(&ctx.project_root.join(&build_root))?;
            for folder in &generated {
                remove_tree(&ctx.project_root.join(folder))?;
            }
            remove_tree(&ctx.project_root.join(".assetflow/staging"))?;
            Ok(())
        })?;
    }

    // vendor: stage third-party assets into the output tree.
    if config.patterns.vendor.is_empty() {
        registry.register("vendor", &["clean"], |_ctx| Ok(()))?;
    } else {
        let fileset = FileSet::compile(&config.patterns.vendor)?;
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(FilterStage::new(VENDOR_ASSETS)?),
            Box::new(RebaseStage::new("vendor")),
        ];
        let output = OutputSpec::replace(join(&config.project.build_root, "vendor"));
        register_pipeline(&mut registry, "vendor", &["clean"], fileset, stages, output)?;
    }

    // sprite: pack icons into a sheet + SCSS variables, as generated sources.
    {
        let fileset = FileSet::compile(&config.patterns.icons)?;
        let stages: Vec<Box<dyn Stage>> = vec![Box::new(SpriteStage::new(
            &config.sprite.image_out,
            &config.sprite.style_out,
            config.sprite.image_path.clone(),
        ))];
        let output = OutputSpec::overlay(".");
        register_pipeline(&mut registry, "sprite", &["clean"], fileset, stages, output)?;
    }

    // styles: compile, prefix, concatenate, minify in production.
    {
        let fileset = FileSet::compile(&config.patterns.styles)?;
        let load_paths = vec![project_root.join("src/styles"), project_root.join("vendor")];

        let mut stages: Vec<Box<dyn Stage>> = vec![
            Box::new(ScssStage::new(load_paths)),
            Box::new(CssPrefixStage),
            Box::new(ConcatStage::new(&config.styles.bundle_name)),
        ];
        if production {
            stages.push(Box::new(CssMinifyStage));
        }

        let output = OutputSpec::replace(join(&config.project.build_root, &config.output.css));
        register_pipeline(
            &mut registry,
            "styles",
            &["clean", "vendor", "sprite"],
            fileset,
            stages,
            output,
        )?;
    }

    // images: copy with icon exclusion, recompress in production.
    {
        let fileset = FileSet::compile(&config.patterns.images)?;
        let mut stages: Vec<Box<dyn Stage>> = vec![Box::new(RebaseStage::new("src/images"))];
        if production {
            stages.push(Box::new(ImageOptStage));
        }

        let output = OutputSpec::replace(join(&config.project.build_root, &config.output.images));
        register_pipeline(
            &mut registry,
            "images",
            &["clean", "vendor", "sprite"],
            fileset,
            stages,
            output,
        )?;
    }

    // html: substitute build markers.
    {
        let fileset = FileSet::compile(&config.patterns.html)?;
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(HtmlReplaceStage::new(config.html.replace.clone())),
            Box::new(RebaseStage::new("src")),
        ];

        let output = OutputSpec::replace(join(&config.project.build_root, &config.output.html));
        register_pipeline(&mut registry, "html", &["clean"], fileset, stages, output)?;
    }

    // bundle: deterministic path-ordered script concatenation.
    {
        let fileset = FileSet::compile(&config.patterns.scripts)?;
        let mut stages: Vec<Box<dyn Stage>> =
            vec![Box::new(ConcatStage::new(&config.scripts.bundle_name))];
        if production {
            stages.push(Box::new(JsMinifyStage));
        }

        let output = OutputSpec::replace(join(&config.project.build_root, &config.output.js));
        register_pipeline(
            &mut registry,
            "bundle",
            &["clean", "vendor"],
            fileset,
            stages,
            output,
        )?;
    }

    // lint tasks: verify sources, write nothing.
    {
        let fileset = FileSet::compile(&config.patterns.scripts)?;
        let stages: Vec<Box<dyn Stage>> =
            vec![Box::new(LintStage::new(&config.lint.scripts.rules)?)];
        register_pipeline(
            &mut registry,
            "lint:scripts",
            &[],
            fileset,
            stages,
            OutputSpec::overlay("."),
        )?;
    }
    {
        let fileset = FileSet::compile(&config.patterns.styles)?;
        let stages: Vec<Box<dyn Stage>> =
            vec![Box::new(LintStage::new(&config.lint.styles.rules)?)];
        register_pipeline(
            &mut registry,
            "lint:styles",
            &[],
            fileset,
            stages,
            OutputSpec::overlay("."),
        )?;
    }

    // build: aggregate of the four output-producing pipelines.
    registry.register("build", &["styles", "images", "html", "bundle"], |_ctx| {
        Ok(())
    })?;

    Ok(registry)
}

fn register_pipeline(
    registry: &mut Registry,
    name: &str,
    deps: &[&str],
    fileset: FileSet,
    stages: Vec<Box<dyn Stage>>,
    output: OutputSpec,
) -> Result<()> {
    let pipeline = Arc::new(Pipeline::new(name, fileset, stages, output));
    registry.register(name, deps, move |ctx: &RunContext| {
        pipeline.run(ctx)?;
        Ok(())
    })
}

fn join(root: &str, sub: &str) -> PathBuf {
    Path::new(root).join(sub)
}

fn remove_tree(path: &Path) -> anyhow::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing {path:?}")),
    }
}
