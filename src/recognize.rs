//! Recognition service
//!
//! Runs the full pipeline on one image: binarize, detect, order, extract,
//! classify, decode. Concurrency policy is reject-don't-queue: a busy
//! instance drops new requests outright so latency stays bounded.

use image::DynamicImage;
use parking_lot::Mutex;
use tracing::debug;

use crate::charset::{arg_max, Charset};
use crate::classifier::Classifier;
use crate::detect::{detect_blocking, CharacterDetector};
use crate::model::Model;
use crate::vision::{binarize, extract_features, order_regions, RegionBox};

/// Output-vector maxima below this are treated as "no confident answer"
/// and the character is omitted rather than guessed.
pub const CONFIDENCE_THRESHOLD: f32 = 0.1;

/// Single-flight recognizer over a classifier and a detector.
pub struct Recognizer<C, D> {
    charset: Charset,
    classifier: C,
    detector: D,
    in_flight: Mutex<()>,
}

impl<C: Classifier, D: CharacterDetector> Recognizer<C, D> {
    pub fn new(charset: Charset, classifier: C, detector: D) -> Self {
        Self {
            charset,
            classifier,
            detector,
            in_flight: Mutex::new(()),
        }
    }

    /// Recognize the text in an image.
    ///
    /// Returns `None` when another call is already in flight (the request
    /// is dropped, not queued). A successful run on an image with no
    /// detectable text returns `Some("")`. Characters whose classifier
    /// output never clears [`CONFIDENCE_THRESHOLD`] are omitted rather
    /// than misreported.
    pub fn recognize(&self, image: &DynamicImage) -> Option<String> {
        // The guard's scope is the whole pipeline; every exit path below
        // releases it.
        let _guard = self.in_flight.try_lock()?;

        let binary = binarize(image);
        let (width, height) = binary.dimensions();

        let Some(boxes) = detect_blocking(&self.detector, &binary) else {
            debug!("detection produced no result");
            return Some(String::new());
        };

        let pixel_boxes: Vec<RegionBox> =
            boxes.iter().map(|b| b.to_pixels(width, height)).collect();
        let ordered = order_regions(pixel_boxes);

        let mut result = String::new();
        for region in &ordered {
            let features = extract_features(&binary, region);
            let output = self.classifier.forward(&features);

            let Some((index, confidence)) = arg_max(&output) else {
                continue;
            };
            if confidence < CONFIDENCE_THRESHOLD {
                debug!("skipping region: confidence {confidence:.3} below threshold");
                continue;
            }
            if let Some(c) = self.charset.char_at(index) {
                result.push(c);
            }
        }

        debug!("recognized {:?} from {} regions", result, ordered.len());
        Some(result)
    }
}

impl<D: CharacterDetector> Recognizer<crate::classifier::Ffnn, D> {
    /// Build a recognizer from a persisted model.
    pub fn from_model(model: Model, detector: D) -> Self {
        let (charset, network) = model.into_parts();
        Self::new(charset, network, detector)
    }
}
