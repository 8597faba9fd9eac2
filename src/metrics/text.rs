//! Text statistics
//!
//! Pure, deterministic measurements of a text. Every function is total:
//! empty or punctuation-only input yields zero rather than an error.
//!
//! Tokenisation rules shared by all measurements:
//! - a *word* is a Unicode-whitespace separated token containing at least
//!   one alphanumeric character
//! - a *sentence* is a span terminated by `.`, `!`, `?`, `…` (or their
//!   full-width forms); spans with zero words are dropped

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::constants::scoring::BURSTINESS_SCALE;

const SENTENCE_TERMINALS: &[char] = &['.', '!', '?', '…', '。', '！', '？'];

/// Hedge and formal-transition markers typical of machine-generated prose.
/// Longer phrases first so alternation prefers them at the same offset.
const AI_MARKERS: &[&str] = &[
    "in today's fast-paced world",
    "it is important to note",
    "it's important to note",
    "it is worth mentioning",
    "it could be argued",
    "it is worth noting",
    "plays a crucial role",
    "navigate the complexities",
    "in the realm of",
    "a testament to",
    "in conclusion",
    "additionally",
    "furthermore",
    "in summary",
    "one might",
    "moreover",
    "it seems",
    "perhaps",
    "delve",
];

/// `'s` contractions counted alongside the suffix forms (possessives are not)
const S_CONTRACTIONS: &[&str] = &[
    "it's", "that's", "there's", "here's", "what's", "who's", "let's", "he's", "she's",
    "where's", "how's",
];

static CONTRACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\p{L}+(?:n't|'(?:re|ll|ve|d|m))$").expect("static contraction regex")
});

static AI_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = AI_MARKERS
        .iter()
        .map(|marker| {
            marker
                .split(' ')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
                .replace('\'', "['’]")
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("static marker regex")
});

// =============================================================================
// Tokenisation
// =============================================================================

/// Word tokens in order of appearance
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .collect()
}

pub fn word_count(text: &str) -> usize {
    words(text).len()
}

/// Case-folded word form with surrounding punctuation removed
fn normalize_word(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .replace('’', "'")
        .to_lowercase()
}

/// Word count of each sentence, in order; empty sentences are excluded
pub fn sentence_lengths(text: &str) -> Vec<usize> {
    text.split(SENTENCE_TERMINALS)
        .map(word_count)
        .filter(|&count| count > 0)
        .collect()
}

// =============================================================================
// Measurements
// =============================================================================

/// Normalized sentence-length variation using the default scale
pub fn burstiness(text: &str) -> f64 {
    burstiness_with_scale(text, BURSTINESS_SCALE)
}

/// Population std-dev of sentence lengths divided by `scale`, capped at 1.
///
/// Texts with fewer than two sentences have no rhythm to measure and score 0.
/// A non-positive or non-finite scale falls back to the default.
pub fn burstiness_with_scale(text: &str, scale: f64) -> f64 {
    let lengths = sentence_lengths(text);
    if lengths.len() < 2 {
        return 0.0;
    }

    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        BURSTINESS_SCALE
    };

    let n = lengths.len() as f64;
    let mean = lengths.iter().sum::<usize>() as f64 / n;
    let variance = lengths
        .iter()
        .map(|&len| {
            let diff = len as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;

    (variance.sqrt() / scale).clamp(0.0, 1.0)
}

/// Type-token ratio over case-folded word forms
pub fn lexical_diversity(text: &str) -> f64 {
    let tokens = words(text);
    if tokens.is_empty() {
        return 0.0;
    }

    let unique: HashSet<String> = tokens.iter().map(|t| normalize_word(t)).collect();
    unique.len() as f64 / tokens.len() as f64
}

fn is_contraction(token: &str) -> bool {
    let word = normalize_word(token);
    CONTRACTION_RE.is_match(&word) || S_CONTRACTIONS.contains(&word.as_str())
}

pub fn contraction_count(text: &str) -> usize {
    words(text).into_iter().filter(|t| is_contraction(t)).count()
}

/// Contraction tokens per word
pub fn contraction_ratio(text: &str) -> f64 {
    let tokens = words(text);
    if tokens.is_empty() {
        return 0.0;
    }

    let contractions = tokens.iter().filter(|t| is_contraction(t)).count();
    contractions as f64 / tokens.len() as f64
}

/// Non-overlapping, case-insensitive occurrences of AI markers
pub fn ai_pattern_hits(text: &str) -> usize {
    AI_MARKER_RE.find_iter(text).count()
}

/// Distinct markers present, lowercased, in order of first appearance
pub fn detected_ai_patterns(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    AI_MARKER_RE
        .find_iter(text)
        .map(|m| {
            m.as_str()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .replace('’', "'")
                .to_lowercase()
        })
        .filter(|marker| seen.insert(marker.clone()))
        .collect()
}
