//! The loaded model plus its matching preprocessing configuration.
//!
//! A `ModelHandle` is created once per process and shared read-only
//! across requests. Inference itself goes through one uncontended mutex
//! because the session's forward pass needs exclusive access.

use crate::audio::Waveform;
use crate::model::config::{self, ModelConfig, PreprocessorConfig};
use crate::model::features::FeatureExtractor;
use crate::model::{InferenceBackend, ModelError, OnnxBackend};
use crate::scores::RawScores;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tracing::info;

/// Loaded model + preprocessing, the process-wide singleton
pub struct ModelHandle {
    backend: Mutex<Box<dyn InferenceBackend>>,
    extractor: FeatureExtractor,
}

impl ModelHandle {
    /// Load all model artifacts from a directory.
    ///
    /// Expects `model.onnx`, `config.json`, and `preprocessor_config.json`;
    /// any missing artifact is fatal. The architecture config's label
    /// mapping is validated against the fixed label set before the weights
    /// are touched. Load cost (~2-3s) is paid once per process.
    pub fn load(model_dir: &Path, n_threads: usize) -> Result<Self, ModelError> {
        let started = Instant::now();

        let model_config = ModelConfig::load(model_dir)?;
        model_config.validate_labels()?;

        let preprocessor = PreprocessorConfig::load(model_dir)?;
        let extractor = FeatureExtractor::new(preprocessor);

        let weights = config::weights_path(model_dir)?;
        let backend = OnnxBackend::load(&weights, n_threads)?;

        info!(
            "Model ready in {:.1}s (dir: {})",
            started.elapsed().as_secs_f32(),
            model_dir.display()
        );

        Ok(Self {
            backend: Mutex::new(Box::new(backend)),
            extractor,
        })
    }

    /// Build a handle around an alternate backend (accelerated runtime,
    /// or a deterministic stub in tests).
    pub fn with_backend(
        backend: Box<dyn InferenceBackend>,
        preprocessor: PreprocessorConfig,
    ) -> Self {
        Self {
            backend: Mutex::new(backend),
            extractor: FeatureExtractor::new(preprocessor),
        }
    }

    /// Run feature extraction and the forward pass on a normalized waveform
    pub fn infer(&self, waveform: &Waveform) -> Result<RawScores, ModelError> {
        let features = self.extractor.extract(waveform.samples());

        let mut backend = self
            .backend
            .lock()
            .map_err(|_| ModelError::InferenceError("inference lock poisoned".to_string()))?;
        backend.infer(&features)
    }
}
