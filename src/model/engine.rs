//! Inference backends.
//!
//! The model is an opaque capability behind `InferenceBackend`: waveform
//! in, eight raw logits out. Production uses the ONNX Runtime backend;
//! tests plug in a deterministic stub.

use crate::labels::NUM_EMOTIONS;
use crate::model::ModelError;
use crate::scores::RawScores;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use std::path::Path;
use tracing::info;

/// A loaded model capable of one forward pass
pub trait InferenceBackend: Send {
    /// Run the forward pass on preprocessed samples, returning the raw
    /// per-class logits in model output order.
    fn infer(&mut self, features: &[f32]) -> Result<RawScores, ModelError>;
}

/// ONNX Runtime backend, CPU by default
pub struct OnnxBackend {
    session: Session,
}

impl OnnxBackend {
    /// Load the ONNX weights file into a new session
    pub fn load(weights: &Path, n_threads: usize) -> Result<Self, ModelError> {
        if !weights.exists() {
            return Err(ModelError::ModelNotFound(weights.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| ModelError::ModelLoadError(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e: ort::Error| ModelError::ModelLoadError(e.to_string()))?
            .with_intra_threads(n_threads)
            .map_err(|e: ort::Error| ModelError::ModelLoadError(e.to_string()))?
            .commit_from_file(weights)
            .map_err(|e: ort::Error| ModelError::ModelLoadError(e.to_string()))?;

        info!("Loaded emotion model from {:?}", weights);

        Ok(Self { session })
    }
}

impl InferenceBackend for OnnxBackend {
    fn infer(&mut self, features: &[f32]) -> Result<RawScores, ModelError> {
        // The model expects input shape [batch, time]
        let input_shape = [1_usize, features.len()];

        let input_tensor = Value::from_array((input_shape, features.to_vec()))
            .map_err(|e: ort::Error| ModelError::InferenceError(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e: ort::Error| ModelError::InferenceError(e.to_string()))?;

        // Logits come back as a single [1, 8] tensor
        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| ModelError::InferenceError("no output from model".to_string()))?;

        let logits = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e: ort::Error| ModelError::InferenceError(e.to_string()))?;

        let values: Vec<f32> = logits.1.iter().copied().collect();
        validate_logits(&values)
    }
}

/// Check the output tensor has exactly one finite logit per class
pub(crate) fn validate_logits(values: &[f32]) -> Result<RawScores, ModelError> {
    if values.len() != NUM_EMOTIONS {
        return Err(ModelError::InferenceError(format!(
            "expected {} logits, model produced {}",
            NUM_EMOTIONS,
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::InferenceError(
            "model produced non-finite logits".to_string(),
        ));
    }

    let mut raw = [0.0f32; NUM_EMOTIONS];
    raw.copy_from_slice(values);
    Ok(raw)
}
