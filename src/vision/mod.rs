//! Vision layer
//!
//! Pure image-to-numbers plumbing: binarization, character-region ordering,
//! and feature-vector construction. Every function here is stateless; each
//! call receives its own buffers and nothing is retained between calls.

pub mod features;
pub mod preprocess;
pub mod regions;

pub use features::{extract_features, CELL_HEIGHT, CELL_WIDTH, FEATURE_LEN};
pub use preprocess::binarize;
pub use regions::order_regions;

use std::path::Path;

use crate::error::OcrError;

/// Detected character bounding box in image pixel coordinates,
/// top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Detector-reported box in a normalized 0.0-1.0 coordinate frame relative
/// to image width/height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedBox {
    /// Convert to pixel coordinates, clamped to the image bounds.
    /// Degenerate boxes are widened to at least one pixel.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> RegionBox {
        let w = image_width as f32;
        let h = image_height as f32;

        let x = (self.x.clamp(0.0, 1.0) * w).round() as u32;
        let y = (self.y.clamp(0.0, 1.0) * h).round() as u32;
        let x = x.min(image_width.saturating_sub(1));
        let y = y.min(image_height.saturating_sub(1));

        let width = ((self.width.max(0.0) * w).round() as u32)
            .max(1)
            .min(image_width - x);
        let height = ((self.height.max(0.0) * h).round() as u32)
            .max(1)
            .min(image_height - y);

        RegionBox::new(x, y, width.max(1), height.max(1))
    }
}

/// Decode an image from disk. Unreadable files surface as
/// [`OcrError::Decode`]; callers must not proceed without a pixel buffer.
pub fn load_image(path: &Path) -> Result<image::DynamicImage, OcrError> {
    let image = image::open(path)?;
    Ok(image)
}
