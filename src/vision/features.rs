//! Feature-vector construction
//!
//! One detected region becomes one fixed-length vector: the region is
//! cropped, scaled to a 16x20 cell grid, flattened row-major with dark
//! pixels as 1.0, and the pre-scale aspect ratio appended as the final
//! scalar. The length never varies; the classifier's input width depends
//! on it.

use image::{imageops, GrayImage};

use crate::vision::RegionBox;

/// Canonical grid width in cells.
pub const CELL_WIDTH: u32 = 16;
/// Canonical grid height in cells.
pub const CELL_HEIGHT: u32 = 20;
/// Flattened grid plus the trailing aspect-ratio scalar.
pub const FEATURE_LEN: usize = (CELL_WIDTH * CELL_HEIGHT) as usize + 1;

/// Pixels at or below this luma are foreground (1.0).
const FOREGROUND_THRESHOLD: u8 = 126;

/// Extract the feature vector for one region of a binarized image.
/// Output length is always [`FEATURE_LEN`] regardless of region size.
pub fn extract_features(image: &GrayImage, region: &RegionBox) -> Vec<f32> {
    let (img_w, img_h) = image.dimensions();

    // Clamp the crop to the image; detectors occasionally over-reach by a
    // pixel at the borders.
    let x = region.x.min(img_w.saturating_sub(1));
    let y = region.y.min(img_h.saturating_sub(1));
    let width = region.width.clamp(1, img_w - x);
    let height = region.height.clamp(1, img_h - y);

    let aspect_ratio = width as f32 / height as f32;

    let cropped = imageops::crop_imm(image, x, y, width, height).to_image();
    let scaled = imageops::resize(
        &cropped,
        CELL_WIDTH,
        CELL_HEIGHT,
        imageops::FilterType::Triangle,
    );

    let mut features = Vec::with_capacity(FEATURE_LEN);
    for pixel in scaled.pixels() {
        features.push(if pixel.0[0] > FOREGROUND_THRESHOLD {
            0.0
        } else {
            1.0
        });
    }
    features.push(aspect_ratio);

    features
}
