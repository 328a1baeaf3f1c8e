//! Memory-aware batch sizing for the stitcher.
//!
//! The first listed image stands in for all of them: its `width * height * 3` bytes is the
//! per-image footprint, and the batch is however many of those fit in a fraction of the memory
//! available at the moment of sampling.

use std::path::Path;

use crate::{
    foundation::error::{StitchkitError, StitchkitResult},
    memory::MemoryProbe,
    source::{image_dimensions, require_images},
};

/// Bytes per pixel of the RGB8 canvas.
pub const BYTES_PER_PIXEL: u64 = 3;

/// Saturates at `u64::MAX` for headers too large to budget.
pub fn per_image_bytes(width: u32, height: u32) -> u64 {
    u64::from(width)
        .saturating_mul(u64::from(height))
        .saturating_mul(BYTES_PER_PIXEL)
}

/// `floor(available * fraction / per_image_bytes)`, capped at `max_images`.
///
/// A zero-sized image yields `max_images`: nothing is budgeted for it.
pub fn estimate_batch_size(
    dims: (u32, u32),
    available_bytes: u64,
    fraction: f64,
    max_images: usize,
) -> usize {
    let per_image = per_image_bytes(dims.0, dims.1);
    if per_image == 0 {
        return max_images;
    }

    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let budget = (available_bytes as f64 * fraction).floor() as u64;
    let fits = budget / per_image;
    usize::try_from(fits).map_or(max_images, |n| n.min(max_images))
}

/// Estimate the batch size for the images in `folder`.
#[tracing::instrument(skip(probe, extensions))]
pub fn calculate_batch_size(
    folder: &Path,
    probe: &dyn MemoryProbe,
    fraction: f64,
    max_images: usize,
    extensions: &[String],
) -> StitchkitResult<usize> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(StitchkitError::validation(format!(
            "memory fraction must be in (0, 1], got {fraction}"
        )));
    }

    let images = require_images(folder, extensions)?;
    let dims = image_dimensions(&images[0])?;
    let available = probe.available_bytes()?;

    let batch = estimate_batch_size(dims, available, fraction, max_images);
    tracing::info!(
        width = dims.0,
        height = dims.1,
        available,
        batch,
        "estimated batch size"
    );
    Ok(batch)
}

/// Projected dimensions and size of `max_images` representative images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeEstimate {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3 * max_images / 1024`.
    pub total_kib: u64,
}

impl SizeEstimate {
    pub fn new(width: u32, height: u32, max_images: usize) -> Self {
        let total = per_image_bytes(width, height).saturating_mul(max_images as u64);
        Self {
            width,
            height,
            total_kib: total / 1024,
        }
    }
}

pub fn estimate_output_size(
    folder: &Path,
    max_images: usize,
    extensions: &[String],
) -> StitchkitResult<SizeEstimate> {
    let images = require_images(folder, extensions)?;
    let (width, height) = image_dimensions(&images[0])?;
    Ok(SizeEstimate::new(width, height, max_images))
}
