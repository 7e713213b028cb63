//! Connected-component reference detector
//!
//! A self-contained [`CharacterDetector`] for bright glyphs on a dark
//! binarized background. Eight-connected components of bright pixels become
//! candidate boxes; specks below a minimum size are discarded. Real
//! deployments can substitute any platform detection capability behind the
//! same trait.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::HashMap;
use tracing::debug;

use crate::detect::{CharacterDetector, DetectionCallback};
use crate::vision::NormalizedBox;

/// Detector over eight-connected bright components.
#[derive(Debug, Clone)]
pub struct ComponentDetector {
    /// Components narrower or shorter than this many pixels are noise.
    pub min_dimension: u32,
}

impl Default for ComponentDetector {
    fn default() -> Self {
        Self { min_dimension: 3 }
    }
}

impl ComponentDetector {
    pub fn new(min_dimension: u32) -> Self {
        Self { min_dimension }
    }

    fn find_boxes(&self, image: &GrayImage) -> Vec<NormalizedBox> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let labels = connected_components(image, Connectivity::Eight, Luma([0u8]));

        // Per-label extents as (min_x, min_y, max_x, max_y).
        let mut extents: HashMap<u32, (u32, u32, u32, u32)> = HashMap::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let id = label.0[0];
            if id == 0 {
                continue;
            }
            let entry = extents.entry(id).or_insert((x, y, x, y));
            entry.0 = entry.0.min(x);
            entry.1 = entry.1.min(y);
            entry.2 = entry.2.max(x);
            entry.3 = entry.3.max(y);
        }

        let w = width as f32;
        let h = height as f32;
        let mut boxes: Vec<NormalizedBox> = extents
            .values()
            .filter_map(|&(min_x, min_y, max_x, max_y)| {
                let box_w = max_x - min_x + 1;
                let box_h = max_y - min_y + 1;
                if box_w < self.min_dimension || box_h < self.min_dimension {
                    return None;
                }
                Some(NormalizedBox {
                    x: min_x as f32 / w,
                    y: min_y as f32 / h,
                    width: box_w as f32 / w,
                    height: box_h as f32 / h,
                })
            })
            .collect();

        // Stable output order; reading order is the orderer's job.
        boxes.sort_by(|a, b| {
            a.x.partial_cmp(&b.x)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
        });

        debug!("component detector found {} candidate boxes", boxes.len());
        boxes
    }
}

impl CharacterDetector for ComponentDetector {
    fn detect(&self, image: &GrayImage, done: DetectionCallback) {
        done(Some(self.find_boxes(image)));
    }
}
