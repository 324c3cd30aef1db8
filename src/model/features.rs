//! Feature extraction: the model-specific transform from raw samples to
//! the input the network expects.
//!
//! For a raw-waveform transformer this is per-utterance zero-mean
//! unit-variance scaling, applied only when the model's own preprocessing
//! artifact asks for it.

use crate::model::PreprocessorConfig;

/// Epsilon added to the variance before dividing, matching the constant
/// the model was trained with
const VAR_EPSILON: f32 = 1e-7;

/// Applies the model's preprocessing transform to a waveform
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: PreprocessorConfig,
}

impl FeatureExtractor {
    pub fn new(config: PreprocessorConfig) -> Self {
        Self { config }
    }

    /// Transform raw samples into model input values.
    ///
    /// When `do_normalize` is set, scales to zero mean and unit variance
    /// over the whole utterance; otherwise passes samples through.
    pub fn extract(&self, samples: &[f32]) -> Vec<f32> {
        if !self.config.do_normalize || samples.is_empty() {
            return samples.to_vec();
        }

        let n = samples.len() as f32;
        let mean = samples.iter().sum::<f32>() / n;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n;
        let denom = (var + VAR_EPSILON).sqrt();

        samples.iter().map(|s| (s - mean) / denom).collect()
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }
}
