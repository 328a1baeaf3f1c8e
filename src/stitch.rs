use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbImage;

use crate::{
    foundation::error::{StitchkitError, StitchkitResult},
    source::{decode_image, image_dimensions, require_images},
};

/// Receives the canvas at every batch boundary.
///
/// The canvas handed over is always the full-size buffer; rows not yet pasted are black.
pub trait CanvasSink {
    /// `pasted` images out of `total` are on the canvas.
    fn checkpoint(&mut self, canvas: &RgbImage, pasted: usize, total: usize) -> StitchkitResult<()>;
}

/// Writes each checkpoint over the same output file.
#[derive(Clone, Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CanvasSink for FileSink {
    fn checkpoint(
        &mut self,
        canvas: &RgbImage,
        pasted: usize,
        total: usize,
    ) -> StitchkitResult<()> {
        ensure_parent_dir(&self.path)?;
        canvas.save(&self.path).map_err(|e| {
            StitchkitError::image(format!("write '{}': {e}", self.path.display()))
        })?;
        tracing::info!(pasted, total, path = %self.path.display(), "saved checkpoint");
        Ok(())
    }
}

pub fn ensure_parent_dir(path: &Path) -> StitchkitResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StitchReport {
    pub width: u32,
    pub height: u32,
    pub images: usize,
    pub batches: usize,
}

/// Vertical stitcher with a fixed checkpoint interval.
#[derive(Clone, Copy, Debug)]
pub struct Stitcher {
    batch_size: usize,
}

impl Stitcher {
    pub fn new(batch_size: usize) -> StitchkitResult<Self> {
        if batch_size == 0 {
            return Err(StitchkitError::validation(
                "batch size must be at least 1 (not enough memory for a single image?)",
            ));
        }
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Paste `images` top to bottom, in the order given.
    ///
    /// Canvas width is the first image's width; height is the sum of all heights.
    #[tracing::instrument(skip(self, images, sink), fields(count = images.len(), batch = self.batch_size))]
    pub fn stitch_into(
        &self,
        images: &[PathBuf],
        sink: &mut dyn CanvasSink,
    ) -> StitchkitResult<StitchReport> {
        let Some(first) = images.first() else {
            return Err(StitchkitError::validation("no images to stitch"));
        };

        let (width, _) = image_dimensions(first)?;
        let mut total_height: u32 = 0;
        for path in images {
            let (_, h) = image_dimensions(path)?;
            total_height = total_height.checked_add(h).ok_or_else(|| {
                StitchkitError::validation("stitched height exceeds u32::MAX pixels")
            })?;
        }

        let mut canvas = RgbImage::new(width, total_height);
        let mut y_offset: u32 = 0;
        let mut pasted = 0usize;
        let mut batches = 0usize;

        for batch in images.chunks(self.batch_size) {
            for path in batch {
                let img = decode_image(path)?.to_rgb8();
                image::imageops::replace(&mut canvas, &img, 0, i64::from(y_offset));
                tracing::debug!(path = %path.display(), y_offset, "pasted image");
                y_offset = y_offset.saturating_add(img.height());
                pasted += 1;
            }
            batches += 1;
            sink.checkpoint(&canvas, pasted, images.len())?;
        }

        Ok(StitchReport {
            width,
            height: total_height,
            images: pasted,
            batches,
        })
    }
}

/// Stitch every recognized image in `folder` into `output`.
pub fn stitch_images(
    folder: &Path,
    output: &Path,
    batch_size: usize,
    extensions: &[String],
) -> StitchkitResult<StitchReport> {
    let stitcher = Stitcher::new(batch_size)?;
    let images = require_images(folder, extensions)?;
    let mut sink = FileSink::new(output);
    stitcher.stitch_into(&images, &mut sink)
}
