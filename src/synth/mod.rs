//! Training-image synthesis
//!
//! Renders random strings over random backgrounds so the trainer never
//! needs hand-labeled data. Font size, foreground color, and alpha are all
//! jittered per call; the jitter keeps the downstream binarization honest
//! instead of letting the network memorize one exact rendering.

pub mod sample;

pub use sample::{Sample, SampleBuilder, SampleSource};

use ab_glyph::{FontVec, PxScale};
use image::{imageops, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rand::{Rng, RngCore};
use std::path::Path;
use tracing::debug;

use crate::charset::Charset;
use crate::error::OcrError;

/// Baseline font size in pixels.
const FONT_SIZE: f32 = 30.0;
/// Absolute size jitter around the baseline.
const FONT_SIZE_JITTER: f32 = 10.0;
/// Fixed spacing between rendered glyphs, for visual separation.
const KERNING: f32 = 8.0;
/// Margin factor per axis when checking whether text fits the background.
const FIT_MARGIN: f32 = 1.1;

/// Source of (image, label) pairs. [`Synthesizer`] is the font-rendering
/// implementation; the seam exists so the sample builder can be exercised
/// with programmatic glyphs.
pub trait TextImageSource: Send + Sync {
    fn generate(
        &self,
        charset: &Charset,
        length: usize,
        rng: &mut dyn RngCore,
    ) -> (RgbaImage, String);
}

/// Generates one (image, label) pair per call from externally supplied
/// font and background pools.
pub struct Synthesizer {
    fonts: Vec<FontVec>,
    backgrounds: Vec<RgbaImage>,
}

impl TextImageSource for Synthesizer {
    fn generate(
        &self,
        charset: &Charset,
        length: usize,
        rng: &mut dyn RngCore,
    ) -> (RgbaImage, String) {
        self.synthesize(charset, length, rng)
    }
}

impl Synthesizer {
    /// Both pools must be non-empty.
    pub fn new(fonts: Vec<FontVec>, backgrounds: Vec<RgbaImage>) -> Result<Self, OcrError> {
        if fonts.is_empty() {
            return Err(OcrError::Synthesis("font pool is empty".into()));
        }
        if backgrounds.is_empty() {
            return Err(OcrError::Synthesis("background pool is empty".into()));
        }
        Ok(Self { fonts, backgrounds })
    }

    /// Render a random `length`-character string over a random background.
    /// Output dimensions vary per call: if the background cannot contain
    /// the text with a 10% margin on each axis, the whole canvas is
    /// uniformly upscaled until it can.
    pub fn synthesize(
        &self,
        charset: &Charset,
        length: usize,
        rng: &mut dyn RngCore,
    ) -> (RgbaImage, String) {
        let text = random_string(charset, length, rng);

        let font = &self.fonts[rng.gen_range(0..self.fonts.len())];
        let background = &self.backgrounds[rng.gen_range(0..self.backgrounds.len())];

        let scale = PxScale::from(FONT_SIZE + jitter(FONT_SIZE_JITTER, rng));
        let color = random_foreground(rng);

        // Per-glyph widths plus fixed kerning between them.
        let glyph_widths: Vec<f32> = text
            .chars()
            .map(|c| text_size(scale, font, &c.to_string()).0 as f32)
            .collect();
        let text_width: f32 = glyph_widths.iter().sum::<f32>()
            + KERNING * text.chars().count().saturating_sub(1) as f32;
        let text_height = text_size(scale, font, &text).1 as f32;

        let (bg_w, bg_h) = background.dimensions();
        let ratio = fit_ratio(bg_w as f32, bg_h as f32, text_width, text_height);
        let canvas_w = ((bg_w as f32 * ratio).ceil() as u32).max(1);
        let canvas_h = ((bg_h as f32 * ratio).ceil() as u32).max(1);

        let mut canvas = if ratio > 1.0 {
            imageops::resize(background, canvas_w, canvas_h, imageops::FilterType::Triangle)
        } else {
            background.clone()
        };

        // Centered layout. Glyphs render into a coverage mask first so the
        // foreground's alpha mixes with the background instead of
        // overwriting it.
        let mut x = (canvas_w as f32 - text_width) / 2.0;
        let y = ((canvas_h as f32 - text_height) / 2.0).max(0.0) as i32;

        let mut mask = GrayImage::new(canvas_w, canvas_h);
        for (c, width) in text.chars().zip(&glyph_widths) {
            draw_text_mut(
                &mut mask,
                Luma([255u8]),
                x.max(0.0) as i32,
                y,
                scale,
                font,
                &c.to_string(),
            );
            x += width + KERNING;
        }
        composite_mask(&mut canvas, &mask, color);

        debug!(
            "synthesized {:?} on {}x{} canvas (scale {:.1})",
            text, canvas_w, canvas_h, scale.x
        );
        (canvas, text)
    }
}

/// Uniform random string over the charset.
pub fn random_string(charset: &Charset, length: usize, rng: &mut dyn RngCore) -> String {
    (0..length)
        .filter_map(|_| charset.char_at(rng.gen_range(0..charset.len())))
        .collect()
}

/// Load a font file into the pool format.
pub fn load_font(path: &Path) -> Result<FontVec, OcrError> {
    let bytes = std::fs::read(path)?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| OcrError::Synthesis(format!("unparsable font {path:?}: {e}")))
}

/// Uniform value in `[-abs_max, abs_max]`.
fn jitter(abs_max: f32, rng: &mut dyn RngCore) -> f32 {
    rng.gen_range(-abs_max..=abs_max)
}

/// Near-white foreground with small per-channel jitter and randomized
/// alpha.
fn random_foreground(rng: &mut dyn RngCore) -> Rgba<u8> {
    let channel = |rng: &mut dyn RngCore| {
        (((0.92 + jitter(0.08, rng)).clamp(0.0, 1.0)) * 255.0) as u8
    };
    let r = channel(rng);
    let g = channel(rng);
    let b = channel(rng);
    let a = (((0.8 + jitter(0.2, rng)).clamp(0.0, 1.0)) * 255.0) as u8;
    Rgba([r, g, b, a])
}

/// Alpha-composite `color` over the canvas wherever the mask has glyph
/// coverage. Coverage multiplies the color's own alpha, so a translucent
/// foreground lets the background bleed through.
fn composite_mask(canvas: &mut RgbaImage, mask: &GrayImage, color: Rgba<u8>) {
    let alpha = color.0[3] as f32 / 255.0;
    for (x, y, coverage) in mask.enumerate_pixels() {
        let weight = coverage.0[0] as f32 / 255.0 * alpha;
        if weight <= 0.0 {
            continue;
        }
        let pixel = canvas.get_pixel_mut(x, y);
        for i in 0..3 {
            let mixed =
                color.0[i] as f32 * weight + pixel.0[i] as f32 * (1.0 - weight);
            pixel.0[i] = mixed.round() as u8;
        }
    }
}

/// Uniform upscale factor so that text (plus margin) fits the canvas.
/// Deficits on both axes compound, mirroring independent per-axis checks.
fn fit_ratio(bg_w: f32, bg_h: f32, text_w: f32, text_h: f32) -> f32 {
    let mut ratio = 1.0;
    if bg_w < text_w * FIT_MARGIN {
        ratio *= (text_w * FIT_MARGIN) / bg_w;
    }
    if bg_h < text_h * FIT_MARGIN {
        ratio *= (text_h * FIT_MARGIN) / bg_h;
    }
    ratio
}
