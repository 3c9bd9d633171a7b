// src/stages/image.rs

use std::io::Cursor;

use anyhow::Context;
use image::ImageFormat;
use tracing::debug;

use crate::pipeline::{FileRecord, Stage};

/// Production image pass: re-encodes PNG records and keeps the smaller of
/// the original and the re-encoded bytes. Non-PNG records (svg and friends)
/// pass through untouched.
pub struct ImageOptStage;

impl Stage for ImageOptStage {
    fn name(&self) -> &str {
        "image-opt"
    }

    fn apply(&self, record: FileRecord) -> anyhow::Result<Option<FileRecord>> {
        if record.extension() != Some("png") {
            return Ok(Some(record));
        }

        let decoded = image::load_from_memory(&record.contents)
            .with_context(|| format!("decoding {:?}", record.path))?;

        let mut encoded = Cursor::new(Vec::new());
        decoded
            .write_to(&mut encoded, ImageFormat::Png)
            .with_context(|| format!("re-encoding {:?}", record.path))?;
        let encoded = encoded.into_inner();

        if encoded.len() < record.contents.len() {
            debug!(
                path = ?record.path,
                before = record.contents.len(),
                after = encoded.len(),
                "recompressed image"
            );
            Ok(Some(record.with_contents(encoded)))
        } else {
            Ok(Some(record))
        }
    }
}
