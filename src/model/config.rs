//! Model configuration artifacts.
//!
//! Three read-only files make up a model directory: the weights
//! (`model.onnx`), the architecture config (`config.json`, carries the
//! output label mapping), and the preprocessing config
//! (`preprocessor_config.json`, carries the normalization constants the
//! model was trained with). All three must exist at startup.

use crate::audio::TARGET_SAMPLE_RATE;
use crate::labels::{Emotion, NUM_EMOTIONS};
use crate::model::ModelError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Weights file name inside the model directory
pub const WEIGHTS_FILE: &str = "model.onnx";
/// Architecture config file name
pub const MODEL_CONFIG_FILE: &str = "config.json";
/// Preprocessing config file name
pub const PREPROCESSOR_CONFIG_FILE: &str = "preprocessor_config.json";

/// Architecture configuration: only the output label mapping matters here
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Output index -> label name, keys are stringified indices
    pub id2label: BTreeMap<String, String>,
}

impl ModelConfig {
    /// Parse `config.json` from a model directory
    pub fn load(model_dir: &Path) -> Result<Self, ModelError> {
        let path = model_dir.join(MODEL_CONFIG_FILE);
        let raw = read_artifact(&path)?;
        serde_json::from_str(&raw)
            .map_err(|e| ModelError::ConfigError(format!("{}: {}", MODEL_CONFIG_FILE, e)))
    }

    /// Validate that the model's label mapping matches the fixed label set,
    /// in order. A mismatch is a startup failure, never a render-time gap.
    pub fn validate_labels(&self) -> Result<(), ModelError> {
        if self.id2label.len() != NUM_EMOTIONS {
            return Err(ModelError::ConfigError(format!(
                "expected {} labels in id2label, found {}",
                NUM_EMOTIONS,
                self.id2label.len()
            )));
        }

        for (index, expected) in Emotion::ALL.iter().enumerate() {
            let label = self
                .id2label
                .get(&index.to_string())
                .ok_or_else(|| {
                    ModelError::ConfigError(format!("id2label is missing index {}", index))
                })?;

            let emotion = Emotion::from_label(label)?;

            if emotion != *expected {
                return Err(ModelError::ConfigError(format!(
                    "id2label index {} is {:?}, expected {:?}",
                    index,
                    label,
                    expected.label()
                )));
            }
        }

        Ok(())
    }
}

/// Preprocessing configuration bundled with the model.
///
/// The normalization constants here were fixed at training time; using
/// anything else silently degrades accuracy, so they are always read from
/// this artifact and never hardcoded.
#[derive(Debug, Clone, Deserialize)]
pub struct PreprocessorConfig {
    /// Whether to apply zero-mean unit-variance normalization
    #[serde(default = "default_true")]
    pub do_normalize: bool,

    /// Input feature dimension (1 for raw waveform models)
    #[serde(default = "default_feature_size")]
    pub feature_size: usize,

    /// Canonical pad value (unused when no padding is applied)
    #[serde(default)]
    pub padding_value: f32,

    /// Sample rate the model was trained at
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: u32,
}

fn default_true() -> bool {
    true
}

fn default_feature_size() -> usize {
    1
}

fn default_sampling_rate() -> u32 {
    TARGET_SAMPLE_RATE
}

impl PreprocessorConfig {
    /// Parse `preprocessor_config.json` from a model directory
    pub fn load(model_dir: &Path) -> Result<Self, ModelError> {
        let path = model_dir.join(PREPROCESSOR_CONFIG_FILE);
        let raw = read_artifact(&path)?;
        let config: PreprocessorConfig = serde_json::from_str(&raw)
            .map_err(|e| ModelError::ConfigError(format!("{}: {}", PREPROCESSOR_CONFIG_FILE, e)))?;

        if config.sampling_rate != TARGET_SAMPLE_RATE {
            return Err(ModelError::ConfigError(format!(
                "model expects {} Hz input, pipeline produces {} Hz",
                config.sampling_rate, TARGET_SAMPLE_RATE
            )));
        }

        Ok(config)
    }
}

/// Resolve and check the weights file path
pub fn weights_path(model_dir: &Path) -> Result<PathBuf, ModelError> {
    let path = model_dir.join(WEIGHTS_FILE);
    if !path.exists() {
        return Err(ModelError::ModelNotFound(path));
    }
    Ok(path)
}

fn read_artifact(path: &Path) -> Result<String, ModelError> {
    if !path.exists() {
        return Err(ModelError::ModelNotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path)
        .map_err(|e| ModelError::ModelLoadError(format!("{}: {}", path.display(), e)))
}
