//! Training run configuration
//!
//! Parameters are fixed before a run starts and never mutated mid-run.
//! Stored in TOML format so a tuned set can be kept next to the model it
//! produced.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Immutable configuration for one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingParameters {
    /// Hidden layer width of the feed-forward network
    pub hidden_nodes: usize,
    /// Backpropagation learning rate
    pub learning_rate: f32,
    /// Momentum factor carried between weight updates
    pub momentum: f32,
    /// Number of synthesized images contributing training samples
    pub input_count: usize,
    /// Number of synthesized images held out for the test error
    pub test_count: usize,
    /// Target test error; also the stagnation tolerance for early stop
    pub error_threshold: f32,
    /// Epoch-callback budget before stagnation early-stop may fire
    pub max_callbacks: usize,
    /// Upper bound (exclusive) on synthesized label length; lower bound is 3
    pub max_text_length: usize,
    /// Retry budget for one sample-generation attempt loop
    pub max_attempts: u32,
}

impl Default for TrainingParameters {
    fn default() -> Self {
        Self {
            hidden_nodes: 100,
            learning_rate: 0.35,
            momentum: 0.7,
            input_count: 200,
            test_count: 40,
            error_threshold: 0.5,
            max_callbacks: 1000,
            max_text_length: 17,
            max_attempts: 100,
        }
    }
}

/// Load training parameters from a TOML file.
pub fn load_parameters(path: &Path) -> Result<TrainingParameters> {
    let content = std::fs::read_to_string(path)?;
    let params: TrainingParameters = toml::from_str(&content)?;
    Ok(params)
}

/// Save training parameters to a TOML file.
pub fn save_parameters(params: &TrainingParameters, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(params)?;
    std::fs::write(path, content)?;
    Ok(())
}
