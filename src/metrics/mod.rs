//! Text Metrics
//!
//! Statistical signals of human-like writing: sentence-length burstiness,
//! lexical diversity, contraction usage and AI-marker density.

pub mod text;

pub use text::{
    ai_pattern_hits, burstiness, burstiness_with_scale, contraction_count, contraction_ratio,
    detected_ai_patterns, lexical_diversity, sentence_lengths, word_count, words,
};

use serde::{Deserialize, Serialize};

use crate::constants::scoring::BURSTINESS_SCALE;

/// Measured properties of one output text
///
/// Computed fresh for every iteration and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub burstiness: f64,
    pub lexical_diversity: f64,
    pub contraction_ratio: f64,
    pub word_count: usize,
    pub sentence_count: usize,
}

impl QualityMetrics {
    /// Measure `text` with the default burstiness scale
    pub fn measure(text: &str) -> Self {
        Self::measure_with_scale(text, BURSTINESS_SCALE)
    }

    pub fn measure_with_scale(text: &str, burstiness_scale: f64) -> Self {
        Self {
            burstiness: burstiness_with_scale(text, burstiness_scale),
            lexical_diversity: lexical_diversity(text),
            contraction_ratio: contraction_ratio(text),
            word_count: word_count(text),
            sentence_count: sentence_lengths(text).len(),
        }
    }
}
