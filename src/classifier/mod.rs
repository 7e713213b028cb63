//! Trainable-classifier seam
//!
//! The pipeline consumes the classifier as an opaque capability: a forward
//! pass for recognition plus an incremental training procedure driven by a
//! per-epoch callback. Alternative architectures slot in behind these two
//! traits without touching the feature pipeline; [`Ffnn`] is the bundled
//! default.

pub mod ffnn;

pub use ffnn::Ffnn;

use crate::error::OcrError;

/// Forward-pass capability used at recognition time.
pub trait Classifier {
    /// Expected feature-vector length.
    fn input_len(&self) -> usize;
    /// Output vector length; must equal the charset size of the model the
    /// classifier was trained for.
    fn output_len(&self) -> usize;
    /// Run one feature vector through the network.
    fn forward(&self, input: &[f32]) -> Vec<f32>;
}

/// Incremental training capability.
///
/// `on_epoch` receives the current test error once per epoch and returns
/// whether training should continue; implementations stop when it returns
/// false, when the test error drops below `error_threshold`, or when their
/// own convergence criterion fires. Whatever weights exist at that point
/// are the result; partial training is a valid outcome.
pub trait TrainableClassifier: Classifier {
    #[allow(clippy::too_many_arguments)]
    fn train(
        &mut self,
        inputs: &[Vec<f32>],
        targets: &[Vec<f32>],
        test_inputs: &[Vec<f32>],
        test_targets: &[Vec<f32>],
        error_threshold: f32,
        on_epoch: &mut dyn FnMut(f32) -> bool,
    ) -> Result<(), OcrError>;
}
