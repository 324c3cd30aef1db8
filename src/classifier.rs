//! The pipeline orchestrator: uploaded bytes in, ranked emotion result out.
//!
//! Composes normalization, inference, and aggregation, and owns the
//! model-loading lifecycle: the model is initialized exactly once (lazily,
//! with a guard against racing cold-start calls) and reused for every
//! request until the process exits.

use crate::audio::{AudioError, AudioFormat, AudioNormalizer, NormalizerConfig, Waveform};
use crate::model::{ModelError, ModelHandle};
use crate::scores::{self, EmotionResult, RawScores};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use thiserror::Error;
use tracing::{debug, error};

/// A failed classification request, carrying the component cause
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Classification failed: {0}")]
    ClassificationFailed(#[source] PipelineError),
}

/// The component-level cause of a failed request
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<AudioError> for ClassifyError {
    fn from(e: AudioError) -> Self {
        ClassifyError::ClassificationFailed(e.into())
    }
}

impl From<ModelError> for ClassifyError {
    fn from(e: ModelError) -> Self {
        ClassifyError::ClassificationFailed(e.into())
    }
}

impl ClassifyError {
    /// The underlying component error
    pub fn cause(&self) -> &PipelineError {
        match self {
            ClassifyError::ClassificationFailed(cause) => cause,
        }
    }

    /// Whether the user can fix this by changing their input
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.cause(),
            PipelineError::Audio(
                AudioError::UnsupportedFormat(_)
                    | AudioError::EmptyAudio
                    | AudioError::TooShort { .. }
            )
        )
    }

    /// A message safe to show the user. Input problems get an actionable
    /// message; internal failures get a generic one (full detail belongs
    /// in the operator log, not the UI).
    pub fn user_message(&self) -> String {
        match self.cause() {
            PipelineError::Audio(
                e @ (AudioError::UnsupportedFormat(_)
                | AudioError::EmptyAudio
                | AudioError::TooShort { .. }),
            ) => format!(
                "Could not process this audio file: {}. \
                 Try a different recording (wav, mp3, flac, m4a, or ogg).",
                e
            ),
            _ => "Emotion analysis failed due to an internal error. Please try again later."
                .to_string(),
        }
    }
}

/// Settings for the classification pipeline
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Directory holding the three model artifacts
    pub model_dir: PathBuf,

    /// Threads for the inference session
    pub n_threads: usize,

    /// Duration bounds for input clips
    pub normalizer: NormalizerConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./model"),
            n_threads: 2,
            normalizer: NormalizerConfig::default(),
        }
    }
}

/// End-to-end emotion classifier
pub struct EmotionClassifier {
    config: ClassifierConfig,
    normalizer: AudioNormalizer,
    handle: OnceLock<ModelHandle>,
    init_lock: Mutex<()>,
}

impl EmotionClassifier {
    /// Create a classifier; the model is not loaded until the first
    /// request (or an explicit `preload`).
    pub fn new(config: ClassifierConfig) -> Self {
        let normalizer = AudioNormalizer::new(config.normalizer.clone());
        Self {
            config,
            normalizer,
            handle: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Create a classifier around an already-loaded model handle
    pub fn with_handle(config: ClassifierConfig, handle: ModelHandle) -> Self {
        let classifier = Self::new(config);
        let _ = classifier.handle.set(handle);
        classifier
    }

    /// Eagerly load the model, paying the startup cost up front
    pub fn preload(&self) -> Result<(), ModelError> {
        self.ensure_loaded().map(|_| ())
    }

    /// Whether the model singleton has been initialized
    pub fn is_ready(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Classify one uploaded clip.
    ///
    /// Runs decode/normalize, inference, and aggregation in sequence.
    /// Initializes the model singleton on first use; any component error
    /// is surfaced wrapped in `ClassificationFailed` with the cause kept
    /// for diagnostics.
    pub fn classify(
        &self,
        bytes: &[u8],
        format: AudioFormat,
    ) -> Result<EmotionResult, ClassifyError> {
        let waveform = self.normalize(bytes, format)?;
        self.classify_waveform(&waveform)
    }

    /// Normalize an uploaded clip without running inference.
    ///
    /// Callers that want to show clip stats (duration, sample count)
    /// alongside the result normalize once and pass the waveform to
    /// `classify_waveform`.
    pub fn normalize(&self, bytes: &[u8], format: AudioFormat) -> Result<Waveform, ClassifyError> {
        let waveform = self.normalizer.normalize(bytes, format)?;
        debug!(
            "Normalized {} clip: {} samples ({:.2}s)",
            format,
            waveform.len(),
            waveform.duration_secs()
        );
        Ok(waveform)
    }

    /// Run inference and aggregation on an already-normalized waveform.
    ///
    /// Initializes the model singleton on first use, like `classify`.
    pub fn classify_waveform(&self, waveform: &Waveform) -> Result<EmotionResult, ClassifyError> {
        let handle = self.ensure_loaded()?;

        let raw = handle.infer(waveform)?;
        let result = scores::aggregate(&raw);

        debug!(
            "Dominant emotion: {} ({:.1}% confidence)",
            result.dominant,
            result.confidence() * 100.0
        );

        Ok(result)
    }

    /// Run inference on an already-normalized waveform.
    ///
    /// Unlike `classify`, this does not trigger model loading: calling it
    /// before the singleton is initialized fails with `ModelNotLoaded`.
    pub fn infer(&self, waveform: &Waveform) -> Result<RawScores, ModelError> {
        let handle = self.handle.get().ok_or(ModelError::ModelNotLoaded)?;
        handle.infer(waveform)
    }

    /// Double-checked one-time initialization: racing cold-start requests
    /// load the model exactly once.
    fn ensure_loaded(&self) -> Result<&ModelHandle, ModelError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }

        let _guard = self
            .init_lock
            .lock()
            .map_err(|_| ModelError::ModelLoadError("initialization lock poisoned".to_string()))?;

        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }

        let handle = ModelHandle::load(&self.config.model_dir, self.config.n_threads)
            .map_err(|e| {
                error!("Model initialization failed: {}", e);
                e
            })?;

        Ok(self.handle.get_or_init(|| handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{Emotion, NUM_EMOTIONS};
    use crate::model::engine::validate_logits;
    use crate::model::{InferenceBackend, PreprocessorConfig};

    struct EnergyBackend;

    // Deterministic stub: logit per class derived from signal energy so
    // different clips produce different, repeatable results.
    impl InferenceBackend for EnergyBackend {
        fn infer(&mut self, features: &[f32]) -> Result<RawScores, ModelError> {
            let energy = features.iter().map(|s| s * s).sum::<f32>() / features.len() as f32;
            let mut logits = [0.0f32; NUM_EMOTIONS];
            for (i, l) in logits.iter_mut().enumerate() {
                *l = (energy * (i as f32 + 1.0)).sin();
            }
            validate_logits(&logits)
        }
    }

    fn preprocessor() -> PreprocessorConfig {
        serde_json::from_str(r#"{"do_normalize": true, "sampling_rate": 16000}"#).unwrap()
    }

    fn stub_classifier() -> EmotionClassifier {
        let handle = ModelHandle::with_backend(Box::new(EnergyBackend), preprocessor());
        EmotionClassifier::with_handle(ClassifierConfig::default(), handle)
    }

    fn wav_tone(seconds: f32, freq: f32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            let n = (seconds * 16000.0) as usize;
            for i in 0..n {
                let t = i as f32 / 16000.0;
                let s = ((2.0 * std::f32::consts::PI * freq * t).sin() * 12000.0) as i16;
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_classify_is_deterministic() {
        let classifier = stub_classifier();
        let bytes = wav_tone(1.0, 330.0);

        let a = classifier.classify(&bytes, AudioFormat::Wav).unwrap();
        let b = classifier.classify(&bytes, AudioFormat::Wav).unwrap();

        assert_eq!(a.dominant, b.dominant);
        for (x, y) in a.scores.iter().zip(b.scores.iter()) {
            assert_eq!(x.emotion, y.emotion);
            assert_eq!(x.probability, y.probability);
        }
    }

    #[test]
    fn test_back_to_back_requests_do_not_cross_contaminate() {
        let classifier = stub_classifier();
        let clip_a = wav_tone(1.0, 220.0);
        let clip_b = wav_tone(2.0, 880.0);

        let first_a = classifier.classify(&clip_a, AudioFormat::Wav).unwrap();
        let _b = classifier.classify(&clip_b, AudioFormat::Wav).unwrap();
        let second_a = classifier.classify(&clip_a, AudioFormat::Wav).unwrap();

        assert_eq!(first_a.dominant, second_a.dominant);
        assert_eq!(
            first_a.scores[0].probability,
            second_a.scores[0].probability
        );
    }

    #[test]
    fn test_classify_wraps_audio_errors() {
        let classifier = stub_classifier();

        let err = classifier
            .classify(b"not audio at all", AudioFormat::Wav)
            .unwrap_err();

        assert!(matches!(
            err.cause(),
            PipelineError::Audio(AudioError::UnsupportedFormat(_))
        ));
        assert!(err.is_user_error());
        assert!(err.user_message().contains("audio"));
    }

    #[test]
    fn test_normalize_then_classify_matches_classify_and_exposes_stats() {
        let classifier = stub_classifier();
        let bytes = wav_tone(2.0, 440.0);

        let waveform = classifier.normalize(&bytes, AudioFormat::Wav).unwrap();
        assert_eq!(waveform.len(), 32000);
        assert!((waveform.duration_secs() - 2.0).abs() < 1e-6);

        let split = classifier.classify_waveform(&waveform).unwrap();
        let combined = classifier.classify(&bytes, AudioFormat::Wav).unwrap();

        assert_eq!(split.dominant, combined.dominant);
        for (x, y) in split.scores.iter().zip(combined.scores.iter()) {
            assert_eq!(x.emotion, y.emotion);
            assert_eq!(x.probability.to_bits(), y.probability.to_bits());
        }
    }

    #[test]
    fn test_internal_errors_get_generic_message() {
        // Non-user-correctable causes from either component all fall
        // through to the generic message
        let resample: ClassifyError = AudioError::ResampleError("bad chunk".to_string()).into();
        assert!(!resample.is_user_error());
        assert!(resample.user_message().contains("internal error"));

        let model: ClassifyError = ModelError::InferenceError("bad tensor".to_string()).into();
        assert!(!model.is_user_error());
        assert!(model.user_message().contains("internal error"));
    }

    #[test]
    fn test_empty_audio_is_user_error() {
        let err: ClassifyError = AudioError::EmptyAudio.into();
        assert!(err.is_user_error());
        assert!(err.user_message().contains("zero samples"));
    }

    #[test]
    fn test_infer_before_load_fails_with_model_not_loaded() {
        let classifier = EmotionClassifier::new(ClassifierConfig::default());
        let waveform = Waveform::from_samples(vec![0.1f32; 16000]);

        let result = classifier.infer(&waveform);
        assert!(matches!(result, Err(ModelError::ModelNotLoaded)));
        assert!(!classifier.is_ready());
    }

    #[test]
    fn test_classify_reports_missing_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClassifierConfig {
            model_dir: dir.path().join("missing"),
            ..Default::default()
        };
        let classifier = EmotionClassifier::new(config);

        let err = classifier
            .classify(&wav_tone(1.0, 440.0), AudioFormat::Wav)
            .unwrap_err();
        assert!(matches!(
            err.cause(),
            PipelineError::Model(ModelError::ModelNotFound(_))
        ));
        assert!(!err.is_user_error());
        // Internal failure: generic message, no internals leaked
        assert!(!err.user_message().contains("missing"));
    }

    #[test]
    fn test_with_handle_is_ready_immediately() {
        let classifier = stub_classifier();
        assert!(classifier.is_ready());
    }

    #[test]
    fn test_result_properties_hold_end_to_end() {
        let classifier = stub_classifier();
        let result = classifier
            .classify(&wav_tone(1.5, 440.0), AudioFormat::Wav)
            .unwrap();

        assert_eq!(result.scores.len(), NUM_EMOTIONS);
        let sum: f32 = result.scores.iter().map(|s| s.probability).sum();
        assert!((sum - 1.0).abs() < 1e-6);
        for pair in result.scores.windows(2) {
            assert!(pair[0].probability >= pair[1].probability);
        }
        assert_eq!(result.dominant, result.scores[0].emotion);
        // Every label appears exactly once
        let mut labels: Vec<Emotion> = result.scores.iter().map(|s| s.emotion).collect();
        labels.sort_by_key(|e| e.index());
        assert_eq!(labels, Emotion::ALL.to_vec());
    }
}
