// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{CacheStoreMode, Environment};

/// Top-level configuration as read from `Assetflow.toml`.
///
/// ```toml
/// [project]
/// env = "development"
/// build_root = "build"
///
/// [patterns.images]
/// include = ["src/images/**/*.png", "src/images/**/*.svg"]
/// exclude = ["src/images/icons/**"]
///
/// [serve]
/// port = 8080
/// ```
///
/// All sections are optional and default to the conventional `src/` layout.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub output: OutputSection,

    #[serde(default)]
    pub patterns: PatternsSection,

    #[serde(default)]
    pub sprite: SpriteSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub scripts: ScriptsSection,

    #[serde(default)]
    pub html: HtmlSection,

    #[serde(default)]
    pub serve: ServeSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub lint: LintSection,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            project: ProjectSection::default(),
            output: OutputSection::default(),
            patterns: PatternsSection::default(),
            sprite: SpriteSection::default(),
            styles: StylesSection::default(),
            scripts: ScriptsSection::default(),
            html: HtmlSection::default(),
            serve: ServeSection::default(),
            watch: WatchSection::default(),
            lint: LintSection::default(),
        }
    }
}

/// Validated configuration.
///
/// Construction goes through `TryFrom<RawConfig>` (see `config::validate`),
/// which guarantees that every glob pattern compiles, lint rules are valid
/// regexes, and global settings are sane. The value is immutable once built
/// and passed by reference (or `Arc`) to each run; there is no process-wide
/// mutable configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectSection,
    pub output: OutputSection,
    pub patterns: PatternsSection,
    pub sprite: SpriteSection,
    pub styles: StylesSection,
    pub scripts: ScriptsSection,
    pub html: HtmlSection,
    pub serve: ServeSection,
    pub watch: WatchSection,
    pub lint: LintSection,
}

impl Config {
    /// Internal constructor used after validation has passed.
    pub(crate) fn new_unchecked(raw: RawConfig) -> Self {
        Self {
            project: raw.project,
            output: raw.output,
            patterns: raw.patterns,
            sprite: raw.sprite,
            styles: raw.styles,
            scripts: raw.scripts,
            html: raw.html,
            serve: raw.serve,
            watch: raw.watch,
            lint: raw.lint,
        }
    }

    /// Replace the environment flag, consuming the config.
    ///
    /// Used by the CLI to apply `--env` on top of the file value before the
    /// config is frozen for the run.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.project.env = env;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new_unchecked(RawConfig::default())
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// `development` (default) or `production`.
    #[serde(default)]
    pub env: Environment,

    /// Root folder receiving the Build Output Tree.
    #[serde(default = "default_build_root")]
    pub build_root: String,

    /// Folders receiving generated sources (sprite sheet + sprite styles).
    /// Removed by `clean` alongside the build root.
    #[serde(default = "default_generated_folders")]
    pub generated_folders: Vec<String>,

    /// Where cache entries live: `memory` (default) or `disk`.
    #[serde(default)]
    pub cache_store: CacheStoreMode,

    /// Upper bound on concurrently executing tasks within one dependency
    /// level. Defaults to the number of available CPUs.
    #[serde(default)]
    pub max_parallel: Option<usize>,
}

fn default_build_root() -> String {
    "build".to_string()
}

fn default_generated_folders() -> Vec<String> {
    vec![
        "src/images/generated".to_string(),
        "src/styles/generated".to_string(),
    ]
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            build_root: default_build_root(),
            generated_folders: default_generated_folders(),
            cache_store: CacheStoreMode::default(),
            max_parallel: None,
        }
    }
}

/// `[output]` section: per-kind folders, relative to `project.build_root`.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_css_out")]
    pub css: String,
    #[serde(default = "default_images_out")]
    pub images: String,
    #[serde(default = "default_js_out")]
    pub js: String,
    #[serde(default = "default_html_out")]
    pub html: String,
}

fn default_css_out() -> String {
    "css".to_string()
}

fn default_images_out() -> String {
    "images".to_string()
}

fn default_js_out() -> String {
    "js".to_string()
}

fn default_html_out() -> String {
    "html".to_string()
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            css: default_css_out(),
            images: default_images_out(),
            js: default_js_out(),
            html: default_html_out(),
        }
    }
}

/// A named group of glob patterns: inclusions plus negations.
///
/// Negation patterns are always applied after inclusion, so
/// `include = ["src/images/**/*.png"]` with
/// `exclude = ["src/images/icons/**"]` matches every png outside `icons/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatternGroup {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl PatternGroup {
    pub fn new<S: Into<String>>(include: Vec<S>, exclude: Vec<S>) -> Self {
        Self {
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }
}

/// `[patterns]` section: one group per input kind.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternsSection {
    #[serde(default = "default_styles_patterns")]
    pub styles: PatternGroup,
    #[serde(default = "default_scripts_patterns")]
    pub scripts: PatternGroup,
    #[serde(default = "default_images_patterns")]
    pub images: PatternGroup,
    #[serde(default = "default_icons_patterns")]
    pub icons: PatternGroup,
    #[serde(default = "default_html_patterns")]
    pub html: PatternGroup,
    /// Vendor assets staged into the pipeline; empty by default.
    #[serde(default)]
    pub vendor: PatternGroup,
}

fn default_styles_patterns() -> PatternGroup {
    PatternGroup::new(vec!["src/styles/**/*.scss"], vec![])
}

fn default_scripts_patterns() -> PatternGroup {
    PatternGroup::new(vec!["src/js/**/*.js"], vec![])
}

fn default_images_patterns() -> PatternGroup {
    PatternGroup::new(
        vec!["src/images/**/*.png", "src/images/**/*.svg"],
        vec!["src/images/icons/**"],
    )
}

fn default_icons_patterns() -> PatternGroup {
    PatternGroup::new(vec!["src/images/icons/*.png"], vec![])
}

fn default_html_patterns() -> PatternGroup {
    PatternGroup::new(vec!["src/*.html"], vec![])
}

impl Default for PatternsSection {
    fn default() -> Self {
        Self {
            styles: default_styles_patterns(),
            scripts: default_scripts_patterns(),
            images: default_images_patterns(),
            icons: default_icons_patterns(),
            html: default_html_patterns(),
            vendor: PatternGroup::default(),
        }
    }
}

/// `[sprite]` section: where the generated sheet and its style variables go.
///
/// Both outputs land under the source tree (in `generated_folders`) so that
/// the `styles` and `images` pipelines pick them up like hand-written
/// sources.
#[derive(Debug, Clone, Deserialize)]
pub struct SpriteSection {
    #[serde(default = "default_sprite_image_out")]
    pub image_out: String,
    #[serde(default = "default_sprite_style_out")]
    pub style_out: String,
    /// Path used to reference the sheet from within the generated styles.
    #[serde(default = "default_sprite_image_path")]
    pub image_path: String,
}

fn default_sprite_image_out() -> String {
    "src/images/generated/sprite.png".to_string()
}

fn default_sprite_style_out() -> String {
    "src/styles/generated/sprite.scss".to_string()
}

fn default_sprite_image_path() -> String {
    "../images/generated/sprite.png".to_string()
}

impl Default for SpriteSection {
    fn default() -> Self {
        Self {
            image_out: default_sprite_image_out(),
            style_out: default_sprite_style_out(),
            image_path: default_sprite_image_path(),
        }
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    /// Name of the concatenated stylesheet in the css output folder.
    #[serde(default = "default_styles_bundle")]
    pub bundle_name: String,
}

fn default_styles_bundle() -> String {
    "styles.css".to_string()
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            bundle_name: default_styles_bundle(),
        }
    }
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    /// Name of the bundled script in the js output folder.
    #[serde(default = "default_scripts_bundle")]
    pub bundle_name: String,
}

fn default_scripts_bundle() -> String {
    "main.js".to_string()
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            bundle_name: default_scripts_bundle(),
        }
    }
}

/// `[html]` section.
///
/// `replace` maps marker names to replacement text for
/// `<!-- build:NAME -->…<!-- endbuild -->` blocks in HTML sources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HtmlSection {
    #[serde(default)]
    pub replace: BTreeMap<String, String>,
}

/// `[serve]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeSection {
    #[serde(default = "default_serve_port")]
    pub port: u16,
}

fn default_serve_port() -> u16 {
    8080
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            port: default_serve_port(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Source roots observed for changes.
    #[serde(default = "default_watch_roots")]
    pub roots: Vec<String>,

    /// Window for coalescing rapid event bursts into one trigger.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_watch_roots() -> Vec<String> {
    vec!["src".to_string()]
}

fn default_debounce_ms() -> u64 {
    250
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            roots: default_watch_roots(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// A single lint rule: a named regex that must not match any source line.
#[derive(Debug, Clone, Deserialize)]
pub struct LintRule {
    pub name: String,
    pub pattern: String,
}

/// Rule list for one lint target.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleList {
    #[serde(default)]
    pub rules: Vec<LintRule>,
}

/// `[lint]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LintSection {
    #[serde(default)]
    pub scripts: RuleList,
    #[serde(default)]
    pub styles: RuleList,
}
