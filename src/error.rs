//! Error taxonomy for the OCR pipeline
//!
//! Recoverable per-sample issues (alignment mismatches, single detection
//! failures) are retried inside the sample builder and never show up here;
//! this enum covers the failures that actually reach a caller.

use thiserror::Error;

/// Errors surfaced by the library.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The source image could not be decoded into a pixel buffer.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Charset construction rejected the input (empty or duplicate chars).
    #[error("invalid charset: {0}")]
    InvalidCharset(String),

    /// Synthesis inputs were unusable (empty pools, unparsable font).
    #[error("synthesis configuration error: {0}")]
    Synthesis(String),

    /// Sample generation exhausted its retry budget without a single
    /// detection run matching its label length.
    #[error("sample generation failed after {attempts} attempts")]
    Generation { attempts: u32 },

    /// Reading or writing the model artifact failed.
    #[error("model persistence failed: {0}")]
    Persistence(#[from] std::io::Error),

    /// The model artifact could not be (de)serialized.
    #[error("model serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The classifier capability rejected its inputs.
    #[error("classifier error: {0}")]
    Classifier(String),
}
