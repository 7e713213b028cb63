//! Aligned sample construction
//!
//! Drives synthesis -> binarization -> detection -> ordering -> feature
//! extraction into (feature, label) pairs. A pair is only ever emitted when
//! the detected box count exactly equals the label length; anything else
//! throws the whole attempt away and retries, up to a bounded budget.

use image::DynamicImage;
use rand::{Rng, RngCore};
use tracing::{debug, warn};

use crate::charset::Charset;
use crate::detect::{detect_blocking, CharacterDetector};
use crate::error::OcrError;
use crate::synth::TextImageSource;
use crate::vision::{binarize, extract_features, order_regions, RegionBox};

/// One aligned training pair: a feature vector and its one-hot label.
#[derive(Debug, Clone)]
pub struct Sample {
    pub features: Vec<f32>,
    pub label: Vec<f32>,
}

/// Source of aligned sample batches. The training orchestrator consumes
/// this seam; tests substitute scripted sources.
pub trait SampleSource: Send + Sync {
    /// Produce the samples of one synthesized string: one sample per
    /// character, never a partial or misaligned batch.
    fn build(&self, rng: &mut dyn RngCore) -> Result<Vec<Sample>, OcrError>;
}

/// Production sample source backed by an image source and a detector.
pub struct SampleBuilder<S, D> {
    source: S,
    detector: D,
    charset: Charset,
    max_text_length: usize,
    max_attempts: u32,
}

impl<S: TextImageSource, D: CharacterDetector> SampleBuilder<S, D> {
    pub fn new(
        source: S,
        detector: D,
        charset: Charset,
        max_text_length: usize,
        max_attempts: u32,
    ) -> Self {
        Self {
            source,
            detector,
            charset,
            max_text_length,
            max_attempts,
        }
    }

    fn attempt(&self, rng: &mut dyn RngCore) -> Result<Option<Vec<Sample>>, OcrError> {
        // Label lengths are drawn from [3, max); degenerate configs still
        // get length 3.
        let upper = self.max_text_length.max(4);
        let length = rng.gen_range(3..upper);

        let (image, text) = self.source.generate(&self.charset, length, rng);
        let binary = binarize(&DynamicImage::ImageRgba8(image));
        let (width, height) = binary.dimensions();

        let Some(boxes) = detect_blocking(&self.detector, &binary) else {
            debug!("detector produced no result, retrying");
            return Ok(None);
        };

        let pixel_boxes: Vec<RegionBox> =
            boxes.iter().map(|b| b.to_pixels(width, height)).collect();
        let ordered = order_regions(pixel_boxes);

        let chars: Vec<char> = text.chars().collect();
        if ordered.len() != chars.len() {
            debug!(
                "alignment mismatch: {} boxes for {} chars, retrying",
                ordered.len(),
                chars.len()
            );
            return Ok(None);
        }

        let mut samples = Vec::with_capacity(chars.len());
        for (region, &c) in ordered.iter().zip(&chars) {
            let features = extract_features(&binary, region);
            let label = self.charset.one_hot(c).ok_or_else(|| {
                OcrError::InvalidCharset(format!("synthesized char {c:?} not in charset"))
            })?;
            samples.push(Sample { features, label });
        }

        Ok(Some(samples))
    }
}

impl<S: TextImageSource, D: CharacterDetector> SampleSource for SampleBuilder<S, D> {
    fn build(&self, rng: &mut dyn RngCore) -> Result<Vec<Sample>, OcrError> {
        for _ in 0..self.max_attempts {
            if let Some(samples) = self.attempt(rng)? {
                return Ok(samples);
            }
        }

        warn!(
            "sample generation gave up after {} attempts",
            self.max_attempts
        );
        Err(OcrError::Generation {
            attempts: self.max_attempts,
        })
    }
}
