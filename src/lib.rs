//! charlens - short-string OCR with a trainable feed-forward recognizer
//!
//! Recognizes short alphanumeric strings in images by segmenting character
//! regions, normalizing each into a fixed 321-value feature vector, and
//! classifying it with a small feed-forward network. A companion training
//! pipeline synthesizes labeled images from font and background pools and
//! drives the training loop with early stopping and cooperative
//! cancellation.
//!
//! The crate is organized around small seams: detection
//! ([`detect::CharacterDetector`]) and classification
//! ([`classifier::Classifier`]) are pluggable capabilities, with a
//! connected-component detector and an FFNN backend bundled as defaults.

pub mod charset;
pub mod classifier;
pub mod config;
pub mod detect;
pub mod error;
pub mod model;
pub mod recognize;
pub mod synth;
pub mod train;
pub mod vision;

pub use charset::Charset;
pub use config::TrainingParameters;
pub use error::OcrError;
pub use model::Model;
pub use recognize::Recognizer;
pub use train::{TrainingEvent, TrainingWorker};
