//! Raw model scores and their conversion into a ranked emotion result.
//!
//! Applies a numerically stable softmax over the eight logits, pairs each
//! probability with its fixed label, and ranks descending. Ties are broken by
//! the fixed label ordering (the sort is stable), so result ordering never
//! depends on iteration order.

use crate::labels::{Emotion, NUM_EMOTIONS};
use serde::{Deserialize, Serialize};

/// Raw per-class logits from one forward pass
pub type RawScores = [f32; NUM_EMOTIONS];

/// One (label, probability) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub emotion: Emotion,
    /// Post-softmax probability in [0, 1]
    pub probability: f32,
}

impl EmotionScore {
    /// Display color for this score's label
    pub fn color(&self) -> &'static str {
        self.emotion.color()
    }
}

/// A full classification result: all eight scores ranked descending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionResult {
    /// All scores, sorted descending by probability
    pub scores: Vec<EmotionScore>,
    /// The top-ranked label
    pub dominant: Emotion,
}

impl EmotionResult {
    /// Confidence of the dominant emotion
    pub fn confidence(&self) -> f32 {
        self.scores[0].probability
    }

    /// Probability for a specific label
    pub fn probability(&self, emotion: Emotion) -> f32 {
        self.scores
            .iter()
            .find(|s| s.emotion == emotion)
            .map(|s| s.probability)
            .unwrap_or(0.0)
    }
}

/// Convert raw logits into a ranked `EmotionResult`
pub fn aggregate(raw: &RawScores) -> EmotionResult {
    let probabilities = softmax(raw);

    let mut scores: Vec<EmotionScore> = Emotion::ALL
        .iter()
        .zip(probabilities.iter())
        .map(|(&emotion, &probability)| EmotionScore {
            emotion,
            probability,
        })
        .collect();

    // Stable sort: equal probabilities keep the fixed label order
    scores.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let dominant = scores[0].emotion;
    EmotionResult { scores, dominant }
}

/// Numerically stable softmax: subtract the max logit before exponentiating
fn softmax(logits: &RawScores) -> [f32; NUM_EMOTIONS] {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let mut out = [0.0f32; NUM_EMOTIONS];
    let mut sum = 0.0f32;
    for (o, &l) in out.iter_mut().zip(logits.iter()) {
        *o = (l - max).exp();
        sum += *o;
    }
    for o in out.iter_mut() {
        *o /= sum;
    }
    out
}
