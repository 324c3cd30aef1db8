//! Offline voice emotion classification.
//!
//! Takes one uploaded audio clip (wav, mp3, flac, m4a, or ogg), normalizes
//! it to the 16 kHz mono signal a pretrained acoustic transformer expects,
//! runs ONNX inference, and returns all eight emotion probabilities ranked
//! with a dominant label.
//!
//! ```text
//! bytes + format → AudioNormalizer → ModelHandle::infer → aggregate
//!                → EmotionResult { scores desc, dominant }
//! ```

pub mod audio;
pub mod classifier;
pub mod labels;
pub mod model;
pub mod scores;

pub use audio::{AudioError, AudioFormat, AudioNormalizer, NormalizerConfig, Waveform};
pub use classifier::{ClassifierConfig, ClassifyError, EmotionClassifier, PipelineError};
pub use labels::{Emotion, LabelError, NUM_EMOTIONS};
pub use model::{InferenceBackend, ModelError, ModelHandle, PreprocessorConfig};
pub use scores::{aggregate, EmotionResult, EmotionScore, RawScores};
