//! Audio ingestion: container decode, mono downmix, resampling, and
//! duration bounds. Everything downstream of this module works on a
//! 16 kHz mono f32 waveform.

pub mod decoder;
pub mod normalizer;
pub mod resampler;

pub use normalizer::{AudioNormalizer, NormalizerConfig, Waveform};

use thiserror::Error;

/// Target sample rate expected by the model
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Errors that can occur while turning uploaded bytes into a waveform
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Unsupported or undecodable audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio file decoded to zero samples")]
    EmptyAudio,

    #[error("Audio too short: {samples} samples ({min} minimum, 0.1 seconds)")]
    TooShort { samples: usize, min: usize },

    #[error("Resampling failed: {0}")]
    ResampleError(String),
}

/// Declared container format of an uploaded clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    M4a,
    Ogg,
}

impl AudioFormat {
    /// The file extension used to hint the container probe
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
            AudioFormat::Ogg => "ogg",
        }
    }

    /// Parse a declared extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Result<AudioFormat, AudioError> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Ok(AudioFormat::Wav),
            "mp3" => Ok(AudioFormat::Mp3),
            "flac" => Ok(AudioFormat::Flac),
            "m4a" => Ok(AudioFormat::M4a),
            "ogg" => Ok(AudioFormat::Ogg),
            other => Err(AudioError::UnsupportedFormat(format!(
                "unrecognized extension {:?} (supported: wav, mp3, flac, m4a, ogg)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(AudioFormat::from_extension("wav").unwrap(), AudioFormat::Wav);
        assert_eq!(AudioFormat::from_extension("MP3").unwrap(), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_extension("m4a").unwrap(), AudioFormat::M4a);
    }

    #[test]
    fn test_format_rejects_unknown_extension() {
        let result = AudioFormat::from_extension("aiff");
        assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_format_extension_roundtrip() {
        for format in [
            AudioFormat::Wav,
            AudioFormat::Mp3,
            AudioFormat::Flac,
            AudioFormat::M4a,
            AudioFormat::Ogg,
        ] {
            assert_eq!(AudioFormat::from_extension(format.extension()).unwrap(), format);
        }
    }
}
