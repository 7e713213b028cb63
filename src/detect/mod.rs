//! Character-region detection seam
//!
//! Detection itself is an external capability: given a binarized image it
//! reports candidate character boxes in a normalized 0.0-1.0 frame, through
//! a completion callback it must invoke exactly once. The pipeline consumes
//! it synchronously via [`detect_blocking`], which parks the caller on a
//! channel until that single completion arrives.

pub mod components;

pub use components::ComponentDetector;

use image::GrayImage;

use crate::vision::NormalizedBox;

/// Completion callback for a detection request. `None` means the detector
/// could not produce boxes at all; an empty vector means it ran and found
/// no text.
pub type DetectionCallback = Box<dyn FnOnce(Option<Vec<NormalizedBox>>) + Send>;

/// External detection capability. Implementations must call `done` exactly
/// once per request, on any thread.
pub trait CharacterDetector: Send + Sync {
    fn detect(&self, image: &GrayImage, done: DetectionCallback);
}

/// Bridge the callback contract to synchronous control flow. Blocks until
/// the detector completes; a detector that drops its callback without
/// calling it resolves to `None` rather than deadlocking.
pub fn detect_blocking(
    detector: &dyn CharacterDetector,
    image: &GrayImage,
) -> Option<Vec<NormalizedBox>> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    detector.detect(
        image,
        Box::new(move |boxes| {
            let _ = tx.send(boxes);
        }),
    );
    rx.recv().unwrap_or(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct ImmediateDetector {
        boxes: Option<Vec<NormalizedBox>>,
    }

    impl CharacterDetector for ImmediateDetector {
        fn detect(&self, _image: &GrayImage, done: DetectionCallback) {
            done(self.boxes.clone());
        }
    }

    struct ThreadedDetector;

    impl CharacterDetector for ThreadedDetector {
        fn detect(&self, _image: &GrayImage, done: DetectionCallback) {
            thread::spawn(move || {
                done(Some(vec![NormalizedBox {
                    x: 0.1,
                    y: 0.2,
                    width: 0.3,
                    height: 0.4,
                }]));
            });
        }
    }

    struct SilentDetector;

    impl CharacterDetector for SilentDetector {
        fn detect(&self, _image: &GrayImage, done: DetectionCallback) {
            // Drops the callback without invoking it.
            drop(done);
        }
    }

    fn image() -> GrayImage {
        GrayImage::new(10, 10)
    }

    #[test]
    fn inline_completion_is_received() {
        let detector = ImmediateDetector { boxes: Some(vec![]) };
        assert_eq!(detect_blocking(&detector, &image()), Some(vec![]));

        let detector = ImmediateDetector { boxes: None };
        assert_eq!(detect_blocking(&detector, &image()), None);
    }

    #[test]
    fn cross_thread_completion_is_received() {
        let boxes = detect_blocking(&ThreadedDetector, &image()).unwrap();
        assert_eq!(boxes.len(), 1);
        assert!((boxes[0].x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn dropped_callback_resolves_to_none() {
        assert_eq!(detect_blocking(&SilentDetector, &image()), None);
    }
}
