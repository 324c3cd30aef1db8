//! Model loading and inference: configuration artifacts, feature
//! extraction, and the ONNX inference backend.

pub mod config;
pub mod engine;
pub mod features;
pub mod handle;

pub use config::{ModelConfig, PreprocessorConfig};
pub use engine::{InferenceBackend, OnnxBackend};
pub use handle::ModelHandle;

use crate::labels::LabelError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during model loading or inference
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model artifact not found: {0}")]
    ModelNotFound(PathBuf),

    #[error(transparent)]
    UnknownLabel(#[from] LabelError),

    #[error("Failed to load model: {0}")]
    ModelLoadError(String),

    #[error("Invalid model configuration: {0}")]
    ConfigError(String),

    #[error("Model is not loaded")]
    ModelNotLoaded,

    #[error("Inference failed: {0}")]
    InferenceError(String),
}

impl From<ort::Error> for ModelError {
    fn from(e: ort::Error) -> Self {
        ModelError::InferenceError(e.to_string())
    }
}
