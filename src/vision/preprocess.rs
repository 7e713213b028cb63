//! Image normalization
//!
//! Converts an arbitrary color image into the binarized bitmap the rest of
//! the pipeline works on. Three fixed stages: full desaturation, a contrast
//! boost to sharpen the glyph/background boundary, then a hard threshold
//! with no dithering (dithering would scatter isolated pixels and corrupt a
//! clean glyph outline).

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

/// Contrast multiplier applied before binarization.
const CONTRAST_FACTOR: f32 = 1.45;

/// Luma cutoff for the 1-bit conversion.
const BINARIZE_THRESHOLD: u8 = 127;

/// Perceptual luma weights (ITU-R BT.709). Channels contribute unequally to
/// perceived brightness, so this is not a plain average.
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

/// Normalize an image into a binary bitmap: every pixel is either 0 (dark)
/// or 255 (bright). Stateless; the caller owns both buffers.
pub fn binarize(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;

        // Desaturating collapses each channel onto the luma axis, so the
        // per-channel weighting happens once here.
        let luma = LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32;
        let contrasted = ((luma - 128.0) * CONTRAST_FACTOR + 128.0).clamp(0.0, 255.0);

        let bit = if contrasted as u8 > BINARIZE_THRESHOLD {
            255
        } else {
            0
        };
        out.put_pixel(x, y, Luma([bit]));
    }

    debug!("binarized {}x{} image", width, height);
    out
}
