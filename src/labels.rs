//! The fixed eight-emotion label set and its display identities.
//!
//! Label ordering matches the model's output layer and is never reordered
//! at inference time. Colors and emojis are fixed lookup tables used by the
//! presentation layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of emotion classes in the model's output layer
pub const NUM_EMOTIONS: usize = 8;

/// Errors related to the label set
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("Unknown emotion label: {0:?}")]
    UnknownLabel(String),
}

/// The eight emotion classes, in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Calm,
    Disgust,
    Fearful,
    Happy,
    Neutral,
    Sad,
    Surprised,
}

impl Emotion {
    /// All emotions in model output order (index = output logit index)
    pub const ALL: [Emotion; NUM_EMOTIONS] = [
        Emotion::Angry,
        Emotion::Calm,
        Emotion::Disgust,
        Emotion::Fearful,
        Emotion::Happy,
        Emotion::Neutral,
        Emotion::Sad,
        Emotion::Surprised,
    ];

    /// The canonical lowercase label string
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Calm => "calm",
            Emotion::Disgust => "disgust",
            Emotion::Fearful => "fearful",
            Emotion::Happy => "happy",
            Emotion::Neutral => "neutral",
            Emotion::Sad => "sad",
            Emotion::Surprised => "surprised",
        }
    }

    /// Fixed display color (hex) for this emotion
    pub fn color(&self) -> &'static str {
        match self {
            Emotion::Angry => "#ff4757",
            Emotion::Calm => "#2ed573",
            Emotion::Disgust => "#ff6b35",
            Emotion::Fearful => "#5352ed",
            Emotion::Happy => "#ffc048",
            Emotion::Neutral => "#747d8c",
            Emotion::Sad => "#3742fa",
            Emotion::Surprised => "#ff3838",
        }
    }

    /// Fixed display emoji for this emotion
    pub fn emoji(&self) -> &'static str {
        match self {
            Emotion::Angry => "\u{1f620}",
            Emotion::Calm => "\u{1f60c}",
            Emotion::Disgust => "\u{1f922}",
            Emotion::Fearful => "\u{1f628}",
            Emotion::Happy => "\u{1f60a}",
            Emotion::Neutral => "\u{1f610}",
            Emotion::Sad => "\u{1f622}",
            Emotion::Surprised => "\u{1f632}",
        }
    }

    /// Parse a label string as produced by the model's `id2label` artifact
    pub fn from_label(label: &str) -> Result<Emotion, LabelError> {
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.label() == label)
            .ok_or_else(|| LabelError::UnknownLabel(label.to_string()))
    }

    /// The logit index of this emotion in the model output
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
