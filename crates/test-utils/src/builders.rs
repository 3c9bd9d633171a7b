#![allow(dead_code)]

use assetflow::config::{Config, LintRule, PatternGroup, RawConfig};
use assetflow::types::{CacheStoreMode, Environment};

/// Builder for [`Config`] to simplify test setup.
pub struct ConfigBuilder {
    raw: RawConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfig::default(),
        }
    }

    pub fn env(mut self, env: Environment) -> Self {
        self.raw.project.env = env;
        self
    }

    pub fn build_root(mut self, root: &str) -> Self {
        self.raw.project.build_root = root.to_string();
        self
    }

    pub fn cache_store(mut self, mode: CacheStoreMode) -> Self {
        self.raw.project.cache_store = mode;
        self
    }

    pub fn generated_folders(mut self, folders: &[&str]) -> Self {
        self.raw.project.generated_folders =
            folders.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn styles(mut self, include: &[&str], exclude: &[&str]) -> Self {
        self.raw.patterns.styles = group(include, exclude);
        self
    }

    pub fn scripts(mut self, include: &[&str], exclude: &[&str]) -> Self {
        self.raw.patterns.scripts = group(include, exclude);
        self
    }

    pub fn images(mut self, include: &[&str], exclude: &[&str]) -> Self {
        self.raw.patterns.images = group(include, exclude);
        self
    }

    pub fn icons(mut self, include: &[&str]) -> Self {
        self.raw.patterns.icons = group(include, &[]);
        self
    }

    pub fn html(mut self, include: &[&str]) -> Self {
        self.raw.patterns.html = group(include, &[]);
        self
    }

    pub fn html_replace(mut self, name: &str, replacement: &str) -> Self {
        self.raw
            .html
            .replace
            .insert(name.to_string(), replacement.to_string());
        self
    }

    pub fn script_lint_rule(mut self, name: &str, pattern: &str) -> Self {
        self.raw.lint.scripts.rules.push(LintRule {
            name: name.to_string(),
            pattern: pattern.to_string(),
        });
        self
    }

    pub fn style_lint_rule(mut self, name: &str, pattern: &str) -> Self {
        self.raw.lint.styles.rules.push(LintRule {
            name: name.to_string(),
            pattern: pattern.to_string(),
        });
        self
    }

    pub fn serve_port(mut self, port: u16) -> Self {
        self.raw.serve.port = port;
        self
    }

    pub fn build(self) -> Config {
        Config::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn group(include: &[&str], exclude: &[&str]) -> PatternGroup {
    PatternGroup::new(include.to_vec(), exclude.to_vec())
}
