//! Normalizes an uploaded clip into the model's expected signal format:
//! mono f32 at 16 kHz, bounded to 20 seconds.

use super::decoder;
use super::resampler::resample_to_target;
use super::{AudioError, AudioFormat, TARGET_SAMPLE_RATE};
use tracing::debug;

/// A normalized single-channel signal at the target sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
}

impl Waveform {
    /// The samples, mono at 16 kHz
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds at the target rate
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / TARGET_SAMPLE_RATE as f32
    }

    #[cfg(test)]
    pub(crate) fn from_samples(samples: Vec<f32>) -> Self {
        Self { samples }
    }
}

/// Duration bounds applied after decode and resample
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Maximum waveform length in samples at 16 kHz; longer input is truncated.
    /// Default: 320_000 (20 seconds)
    pub max_samples: usize,

    /// Minimum waveform length in samples; shorter input is rejected with
    /// `TooShort` rather than padded (the model accepts variable length).
    /// Default: 1600 (0.1 seconds)
    pub min_samples: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_samples: 20 * TARGET_SAMPLE_RATE as usize,
            min_samples: TARGET_SAMPLE_RATE as usize / 10,
        }
    }
}

/// Decodes an arbitrary uploaded clip into a model-ready waveform
#[derive(Debug, Clone, Default)]
pub struct AudioNormalizer {
    config: NormalizerConfig,
}

impl AudioNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Decode, downmix, resample, and bound an uploaded clip.
    ///
    /// Fails with `UnsupportedFormat` when the container or codec cannot be
    /// decoded, `EmptyAudio` when zero samples decode, and `TooShort` when
    /// the clip is under the configured minimum.
    pub fn normalize(&self, bytes: &[u8], format: AudioFormat) -> Result<Waveform, AudioError> {
        let decoded = decoder::decode(bytes, format)?;

        // Bound work before resampling: anything past the cap is discarded
        let max_source_samples = (self.config.max_samples as u64 * decoded.sample_rate as u64
            / TARGET_SAMPLE_RATE as u64) as usize;
        let source = if decoded.samples.len() > max_source_samples {
            debug!(
                "Truncating clip from {} to {} source samples",
                decoded.samples.len(),
                max_source_samples
            );
            &decoded.samples[..max_source_samples]
        } else {
            &decoded.samples[..]
        };

        let mut samples = resample_to_target(source, decoded.sample_rate)?;

        // Resampler rounding can leave a few samples over the cap
        samples.truncate(self.config.max_samples);

        if samples.is_empty() {
            return Err(AudioError::EmptyAudio);
        }
        if samples.len() < self.config.min_samples {
            return Err(AudioError::TooShort {
                samples: samples.len(),
                min: self.config.min_samples,
            });
        }

        debug!(
            "Normalized waveform: {} samples ({:.2}s at {} Hz)",
            samples.len(),
            samples.len() as f32 / TARGET_SAMPLE_RATE as f32,
            TARGET_SAMPLE_RATE
        );

        Ok(Waveform { samples })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn tone(seconds: f32, sample_rate: u32) -> Vec<i16> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                ((2.0 * std::f32::consts::PI * 220.0 * t).sin() * 8000.0) as i16
            })
            .collect()
    }

    #[test]
    fn test_normalize_16k_mono_passthrough_length() {
        let samples = tone(1.0, 16000);
        let bytes = wav_bytes(&samples, 16000, 1);

        let waveform = AudioNormalizer::default()
            .normalize(&bytes, AudioFormat::Wav)
            .unwrap();
        assert_eq!(waveform.len(), 16000);
        assert!((waveform.duration_secs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_resamples_to_16k() {
        let samples = tone(1.0, 48000);
        let bytes = wav_bytes(&samples, 48000, 1);

        let waveform = AudioNormalizer::default()
            .normalize(&bytes, AudioFormat::Wav)
            .unwrap();
        // Within 1% of one second at 16 kHz
        assert!((waveform.len() as i64 - 16000).abs() <= 160);
    }

    #[test]
    fn test_normalize_truncates_long_clip() {
        let samples = tone(25.0, 16000);
        let bytes = wav_bytes(&samples, 16000, 1);

        let waveform = AudioNormalizer::default()
            .normalize(&bytes, AudioFormat::Wav)
            .unwrap();
        assert_eq!(waveform.len(), 320_000);
        assert!((waveform.duration_secs() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_rejects_too_short() {
        let samples = tone(0.05, 16000); // 50ms, under the 100ms minimum
        let bytes = wav_bytes(&samples, 16000, 1);

        let result = AudioNormalizer::default().normalize(&bytes, AudioFormat::Wav);
        assert!(matches!(result, Err(AudioError::TooShort { .. })));
    }

    #[test]
    fn test_normalize_zero_frame_wav_is_empty_audio() {
        let bytes = wav_bytes(&[], 16000, 1);
        let result = AudioNormalizer::default().normalize(&bytes, AudioFormat::Wav);
        assert!(matches!(result, Err(AudioError::EmptyAudio)));
    }

    #[test]
    fn test_normalize_rejects_garbage_bytes() {
        let bytes = b"definitely not audio".to_vec();
        let result = AudioNormalizer::default().normalize(&bytes, AudioFormat::Mp3);
        assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let samples = tone(2.0, 44100);
        let bytes = wav_bytes(&samples, 44100, 1);

        let normalizer = AudioNormalizer::default();
        let a = normalizer.normalize(&bytes, AudioFormat::Wav).unwrap();
        let b = normalizer.normalize(&bytes, AudioFormat::Wav).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_downmixes_stereo() {
        let mono = tone(1.0, 16000);
        let mut stereo = Vec::with_capacity(mono.len() * 2);
        for &s in &mono {
            stereo.push(s);
            stereo.push(s);
        }
        let bytes = wav_bytes(&stereo, 16000, 2);

        let waveform = AudioNormalizer::default()
            .normalize(&bytes, AudioFormat::Wav)
            .unwrap();
        assert_eq!(waveform.len(), 16000);
    }

    #[test]
    fn test_custom_min_samples_policy() {
        let config = NormalizerConfig {
            min_samples: 32000, // 2 seconds
            ..Default::default()
        };
        let samples = tone(1.0, 16000);
        let bytes = wav_bytes(&samples, 16000, 1);

        let result = AudioNormalizer::new(config).normalize(&bytes, AudioFormat::Wav);
        assert!(matches!(result, Err(AudioError::TooShort { .. })));
    }
}
