// src/stages/sprite.rs

use std::fmt::Write as _;
use std::io::Cursor;
use std::path::PathBuf;

use anyhow::Context;
use image::{ImageFormat, RgbaImage};
use tracing::debug;

use crate::pipeline::{FileRecord, Stage};

/// Aggregate stage packing icon images into a single sprite sheet plus an
/// SCSS file of position variables and `.icon-NAME` helper classes.
///
/// Icons are stacked vertically in path order (the pipeline's deterministic
/// aggregate order), so positions are stable across runs. Both outputs carry
/// project-relative paths and are written as generated sources for the
/// styles and images pipelines to pick up.
pub struct SpriteStage {
    sheet_path: PathBuf,
    style_path: PathBuf,
    /// How the generated styles reference the sheet.
    image_ref: String,
}

impl SpriteStage {
    pub fn new(
        sheet_path: impl Into<PathBuf>,
        style_path: impl Into<PathBuf>,
        image_ref: impl Into<String>,
    ) -> Self {
        Self {
            sheet_path: sheet_path.into(),
            style_path: style_path.into(),
            image_ref: image_ref.into(),
        }
    }
}

impl Stage for SpriteStage {
    fn name(&self) -> &str {
        "sprite"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        Ok(Some(record))
    }

    fn is_aggregate(&self) -> bool {
        true
    }

    fn apply_set(&self, records: Vec<FileRecord>) -> anyhow::Result<Vec<FileRecord>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut icons = Vec::with_capacity(records.len());
        for record in &records {
            let decoded = image::load_from_memory(&record.contents)
                .with_context(|| format!("decoding icon {:?}", record.path))?
                .to_rgba8();
            let name = record
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(sanitize_name)
                .unwrap_or_else(|| "icon".to_string());
            icons.push((name, decoded));
        }

        let sheet_width = icons.iter().map(|(_, img)| img.width()).max().unwrap_or(0);
        let sheet_height = icons.iter().map(|(_, img)| img.height()).sum();

        let mut sheet = RgbaImage::new(sheet_width, sheet_height);
        let mut styles = String::new();
        let mut y = 0u32;

        for (name, icon) in &icons {
            image::imageops::overlay(&mut sheet, icon, 0, y as i64);

            let (w, h) = (icon.width(), icon.height());
            let offset = if y == 0 { "0".to_string() } else { format!("-{y}px") };
            writeln!(styles, "$icon-{name}-x: 0;").ok();
            writeln!(styles, "$icon-{name}-y: {offset};").ok();
            writeln!(styles, "$icon-{name}-width: {w}px;").ok();
            writeln!(styles, "$icon-{name}-height: {h}px;").ok();
            writeln!(styles, ".icon-{name} {{").ok();
            writeln!(styles, "  background-image: url(\"{}\");", self.image_ref).ok();
            writeln!(styles, "  background-position: 0 {offset};").ok();
            writeln!(styles, "  width: {w}px;").ok();
            writeln!(styles, "  height: {h}px;").ok();
            writeln!(styles, "}}").ok();

            y += h;
        }

        let mut encoded = Cursor::new(Vec::new());
        sheet
            .write_to(&mut encoded, ImageFormat::Png)
            .context("encoding sprite sheet")?;

        debug!(
            icons = icons.len(),
            width = sheet_width,
            height = sheet_height,
            "packed sprite sheet"
        );

        Ok(vec![
            FileRecord::new(self.sheet_path.clone(), encoded.into_inner()),
            FileRecord::new(self.style_path.clone(), styles.into_bytes()),
        ])
    }
}

/// Icon names become SCSS identifiers; anything unusual collapses to `-`.
fn sanitize_name(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
