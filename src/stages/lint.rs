// src/stages/lint.rs

use std::fmt::Write as _;

use anyhow::bail;
use regex::Regex;

use crate::config::LintRule;
use crate::pipeline::{FileRecord, Stage};

/// Scans each record line by line against a set of named regex rules and
/// fails the pipeline when any rule matches. Clean records are dropped from
/// the set — lint pipelines verify sources, they never write output.
pub struct LintStage {
    rules: Vec<(String, Regex)>,
}

impl LintStage {
    pub fn new(rules: &[LintRule]) -> anyhow::Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| Ok((rule.name.clone(), Regex::new(&rule.pattern)?)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { rules })
    }
}

impl Stage for LintStage {
    fn name(&self) -> &str {
        "lint"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        let text = record.text()?;
        let mut violations = String::new();
        let mut count = 0usize;

        for (lineno, line) in text.lines().enumerate() {
            for (name, regex) in &self.rules {
                if regex.is_match(line) {
                    count += 1;
                    if count <= 10 {
                        writeln!(
                            violations,
                            "{}:{}: rule '{}' matched: {}",
                            record.path.display(),
                            lineno + 1,
                            name,
                            line.trim()
                        )
                        .ok();
                    }
                }
            }
        }

        if count > 0 {
            if count > 10 {
                writeln!(violations, "… and {} more", count - 10).ok();
            }
            bail!("{count} lint violation(s)\n{violations}");
        }

        Ok(None)
    }
}
