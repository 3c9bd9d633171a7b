// src/config/validate.rs

use globset::Glob;
use regex::Regex;

use crate::config::model::{Config, PatternGroup, RawConfig, RuleList};
use crate::errors::{AssetflowError, Result};

impl TryFrom<RawConfig> for Config {
    type Error = AssetflowError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(Config::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfig) -> Result<()> {
    validate_project(cfg)?;
    validate_patterns(cfg)?;
    validate_lint_rules(cfg)?;
    Ok(())
}

fn validate_project(cfg: &RawConfig) -> Result<()> {
    let root = cfg.project.build_root.trim();
    if root.is_empty() || root == "." || root == "/" {
        return Err(AssetflowError::Config(format!(
            "[project].build_root must name a dedicated folder (got {:?})",
            cfg.project.build_root
        )));
    }

    if cfg.watch.debounce_ms == 0 {
        return Err(AssetflowError::Config(
            "[watch].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(0) = cfg.project.max_parallel {
        return Err(AssetflowError::Config(
            "[project].max_parallel must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_patterns(cfg: &RawConfig) -> Result<()> {
    let groups: [(&str, &PatternGroup); 6] = [
        ("styles", &cfg.patterns.styles),
        ("scripts", &cfg.patterns.scripts),
        ("images", &cfg.patterns.images),
        ("icons", &cfg.patterns.icons),
        ("html", &cfg.patterns.html),
        ("vendor", &cfg.patterns.vendor),
    ];

    for (name, group) in groups {
        for pat in group.include.iter().chain(group.exclude.iter()) {
            Glob::new(pat).map_err(|e| {
                AssetflowError::Config(format!(
                    "invalid glob pattern {pat:?} in [patterns.{name}]: {e}"
                ))
            })?;
        }
    }

    Ok(())
}

fn validate_lint_rules(cfg: &RawConfig) -> Result<()> {
    validate_rule_list("scripts", &cfg.lint.scripts)?;
    validate_rule_list("styles", &cfg.lint.styles)?;
    Ok(())
}

fn validate_rule_list(name: &str, list: &RuleList) -> Result<()> {
    for rule in list.rules.iter() {
        if rule.name.trim().is_empty() {
            return Err(AssetflowError::Config(format!(
                "[lint.{name}] contains a rule with an empty name"
            )));
        }
        Regex::new(&rule.pattern).map_err(|e| {
            AssetflowError::Config(format!(
                "invalid regex {:?} for lint rule '{}' in [lint.{name}]: {e}",
                rule.pattern, rule.name
            ))
        })?;
    }
    Ok(())
}
