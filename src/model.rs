//! Persisted model artifact
//!
//! One JSON record holding the charset and the trained network. Written
//! atomically (temp file + rename) and read entirely before use; the
//! charset is immutable once a model exists, since the network's output
//! indices are bound to it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::charset::Charset;
use crate::classifier::Ffnn;
use crate::error::OcrError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    charset: Charset,
    network: Ffnn,
}

impl Model {
    pub fn new(charset: Charset, network: Ffnn) -> Self {
        Self { charset, network }
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    pub fn network(&self) -> &Ffnn {
        &self.network
    }

    pub fn into_parts(self) -> (Charset, Ffnn) {
        (self.charset, self.network)
    }

    /// Read and deserialize a model artifact in full.
    pub fn load(path: &Path) -> Result<Self, OcrError> {
        let data = fs::read_to_string(path)?;
        let model: Model = serde_json::from_str(&data)?;
        info!(
            "loaded model from {:?} ({} output classes)",
            path,
            model.charset.len()
        );
        Ok(model)
    }

    /// Serialize and write the artifact atomically: the bytes land in a
    /// sibling temp file first and are renamed into place, so a crashed
    /// write never leaves a truncated model behind.
    pub fn save(&self, path: &Path) -> Result<(), OcrError> {
        let data = serde_json::to_string(self)?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, path)?;

        info!("saved model to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::vision::FEATURE_LEN;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model() -> Model {
        let charset = Charset::new("AB").unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let network = Ffnn::new(FEATURE_LEN, 10, charset.len(), 0.35, 0.7, &mut rng);
        Model::new(charset, network)
    }

    #[test]
    fn save_and_load_round_trip() {
        let model = model();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        model.save(&path).unwrap();
        let loaded = Model::load(&path).unwrap();

        assert_eq!(loaded.charset(), model.charset());
        let input = vec![0.5; FEATURE_LEN];
        let before = model.network().forward(&input);
        let after = loaded.network().forward(&input);
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn no_temp_file_left_behind() {
        let model = model();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        model.save(&path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn load_missing_file_is_persistence_error() {
        let err = Model::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, OcrError::Persistence(_)));
    }

    #[test]
    fn load_corrupt_file_is_serialize_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, "{not json").unwrap();

        let err = Model::load(&path).unwrap_err();
        assert!(matches!(err, OcrError::Serialize(_)));
    }
}
