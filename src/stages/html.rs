// src/stages/html.rs

use std::collections::BTreeMap;

use anyhow::bail;

use crate::pipeline::{FileRecord, Stage};

/// Substitutes `<!-- build:NAME -->…<!-- endbuild -->` blocks with the
/// configured replacement text. Markers without a configured replacement are
/// left untouched; an unterminated block is an error.
pub struct HtmlReplaceStage {
    replacements: BTreeMap<String, String>,
}

impl HtmlReplaceStage {
    pub fn new(replacements: BTreeMap<String, String>) -> Self {
        Self { replacements }
    }
}

impl Stage for HtmlReplaceStage {
    fn name(&self) -> &str {
        "html-replace"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        let text = record.text()?;
        let replaced = substitute(text, &self.replacements)?;
        Ok(Some(record.with_contents(replaced.into_bytes())))
    }
}

const OPEN_PREFIX: &str = "<!-- build:";
const OPEN_SUFFIX: &str = "-->";
const CLOSE: &str = "<!-- endbuild -->";

fn substitute(input: &str, replacements: &BTreeMap<String, String>) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(OPEN_PREFIX) {
        out.push_str(&rest[..start]);
        let after_prefix = &rest[start + OPEN_PREFIX.len()..];

        let Some(name_end) = after_prefix.find(OPEN_SUFFIX) else {
            bail!("unterminated build marker");
        };
        let name = after_prefix[..name_end].trim();
        let after_open = &after_prefix[name_end + OPEN_SUFFIX.len()..];

        let Some(close) = after_open.find(CLOSE) else {
            bail!("build block '{name}' has no endbuild marker");
        };

        match replacements.get(name) {
            Some(replacement) => {
                out.push_str(replacement);
            }
            None => {
                // Keep the whole block when nothing is configured for it.
                out.push_str(&rest[start..start
                    + OPEN_PREFIX.len()
                    + name_end
                    + OPEN_SUFFIX.len()
                    + close
                    + CLOSE.len()]);
            }
        }

        rest = &after_open[close + CLOSE.len()..];
    }

    out.push_str(rest);
    Ok(out)
}
