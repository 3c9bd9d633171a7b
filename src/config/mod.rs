// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] holds the serde TOML models (raw and validated).
//! - [`loader`] reads and validates a config file from disk.
//! - [`validate`] checks pattern groups, lint rules and global sanity.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    Config, HtmlSection, LintRule, LintSection, OutputSection, PatternGroup, PatternsSection,
    ProjectSection, RawConfig, RuleList, ScriptsSection, ServeSection, SpriteSection,
    StylesSection, WatchSection,
};
