// src/stages/css.rs

//! CSS post-processing: vendor prefixing and whitespace minification.

use crate::pipeline::{FileRecord, Stage};

/// Properties that still want vendor-prefixed duplicates in the browser
/// matrix this pipeline targets.
const PREFIXED_PROPERTIES: &[(&str, &[&str])] = &[
    ("user-select", &["-webkit-", "-moz-", "-ms-"]),
    ("appearance", &["-webkit-", "-moz-"]),
    ("backdrop-filter", &["-webkit-"]),
    ("text-size-adjust", &["-webkit-", "-ms-"]),
    ("box-decoration-break", &["-webkit-"]),
    ("tab-size", &["-moz-"]),
    ("hyphens", &["-webkit-", "-ms-"]),
    ("mask-image", &["-webkit-"]),
];

/// Inserts vendor-prefixed copies of declarations for a fixed property set.
/// The unprefixed declaration always stays last so it wins where supported.
pub struct CssPrefixStage;

impl Stage for CssPrefixStage {
    fn name(&self) -> &str {
        "autoprefix"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        let text = record.text()?;
        let mut out = String::with_capacity(text.len());

        for line in text.lines() {
            let trimmed = line.trim_start();
            let indent = &line[..line.len() - trimmed.len()];

            let prefixes = PREFIXED_PROPERTIES.iter().find_map(|(prop, prefixes)| {
                let rest = trimmed.strip_prefix(prop)?;
                rest.trim_start().starts_with(':').then_some(*prefixes)
            });

            if let Some(prefixes) = prefixes {
                for prefix in prefixes {
                    out.push_str(indent);
                    out.push_str(prefix);
                    out.push_str(trimmed);
                    out.push('\n');
                }
            }
            out.push_str(line);
            out.push('\n');
        }

        Ok(Some(record.with_contents(out.into_bytes())))
    }
}

/// Strips comments and collapses whitespace. Good enough to shrink output
/// in production builds; not a structural CSS rewriter.
pub struct CssMinifyStage;

impl Stage for CssMinifyStage {
    fn name(&self) -> &str {
        "css-minify"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        let text = record.text()?;
        let minified = minify(text);
        Ok(Some(record.with_contents(minified.into_bytes())))
    }
}

fn minify(input: &str) -> String {
    let stripped = strip_block_comments(input);
    let mut out = String::with_capacity(stripped.len());
    let mut in_string: Option<char> = None;
    let mut pending_space = false;

    for c in stripped.chars() {
        if let Some(quote) = in_string {
            out.push(c);
            if c == quote {
                in_string = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                if pending_space && needs_space(&out) {
                    out.push(' ');
                }
                pending_space = false;
                in_string = Some(c);
                out.push(c);
            }
            c if c.is_whitespace() => pending_space = true,
            '{' | '}' | ':' | ';' | ',' | '>' => {
                // Punctuation never needs surrounding whitespace.
                if c == '}' && out.ends_with(';') {
                    out.pop();
                }
                pending_space = false;
                out.push(c);
            }
            _ => {
                if pending_space && needs_space(&out) {
                    out.push(' ');
                }
                pending_space = false;
                out.push(c);
            }
        }
    }

    out
}

fn needs_space(out: &str) -> bool {
    !matches!(
        out.chars().last(),
        None | Some('{' | '}' | ':' | ';' | ',' | '>' | '(')
    )
}

fn strip_block_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start..].find("*/") {
            Some(end) => rest = &rest[start + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}
