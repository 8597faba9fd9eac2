//! Core request/response types
//!
//! `TransformRequest` and `TransformResult` form the upward contract consumed
//! by the web form and CLI. Field names are part of that contract.

pub mod error;

pub use error::{
    ErrorCategory, ErrorClassifier, HumaniseError, LlmError, Result, ValidationError,
    ValidationErrorKind,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::pipeline::MIN_INPUT_CHARS;
use crate::metrics::QualityMetrics;

// =============================================================================
// Mode
// =============================================================================

/// Target stylistic register
///
/// Drives both the exemplar filter and the generation instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Marketing and persuasive copy
    Sales,
    /// Editorial and news writing
    Journalist,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Sales, Mode::Journalist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Sales => "sales",
            Mode::Journalist => "journalist",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Sales => "Sales & Marketing",
            Mode::Journalist => "Journalist & Editorial",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Mode::Sales => "Conversational, persuasive copy with strong CTAs",
            Mode::Journalist => "Objective reporting with engaging narrative",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sales" => Ok(Mode::Sales),
            "journalist" => Ok(Mode::Journalist),
            other => Err(ValidationError::new(
                ValidationErrorKind::InvalidMode,
                format!("Unknown mode '{}'. Valid values: sales, journalist", other),
            )
            .with_field("mode")),
        }
    }
}

// =============================================================================
// Request
// =============================================================================

/// A single humanisation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformRequest {
    pub input_text: String,
    pub mode: Mode,
    /// Optional retrieval hint; the input text is embedded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_hint: Option<String>,
}

impl TransformRequest {
    pub fn new(input_text: impl Into<String>, mode: Mode) -> Self {
        Self {
            input_text: input_text.into(),
            mode,
            topic_hint: None,
        }
    }

    /// Build from untyped inputs, rejecting unknown modes
    pub fn parse(input_text: impl Into<String>, mode: &str) -> Result<Self> {
        let mode = mode.parse::<Mode>()?;
        Ok(Self::new(input_text, mode))
    }

    pub fn with_topic_hint(mut self, hint: impl Into<String>) -> Self {
        let hint = hint.into();
        self.topic_hint = if hint.trim().is_empty() {
            None
        } else {
            Some(hint)
        };
        self
    }

    /// Check input preconditions before any external call is made
    ///
    /// `min_chars` below `MIN_INPUT_CHARS` is raised to it.
    pub fn validate(&self, min_chars: usize, max_chars: usize) -> Result<()> {
        let min_chars = min_chars.max(MIN_INPUT_CHARS);
        let trimmed = self.input_text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::Empty,
                "input text must not be empty",
            )
            .with_field("input_text")
            .into());
        }

        let chars = trimmed.chars().count();
        if chars < min_chars {
            return Err(ValidationError::new(
                ValidationErrorKind::TooShort,
                "input text is too short",
            )
            .with_field("input_text")
            .with_comparison(format!(">= {} characters", min_chars), chars.to_string())
            .into());
        }
        if chars > max_chars {
            return Err(ValidationError::new(
                ValidationErrorKind::TooLong,
                "input text is too long",
            )
            .with_field("input_text")
            .with_comparison(format!("<= {} characters", max_chars), chars.to_string())
            .into());
        }

        Ok(())
    }

    /// Query used for exemplar retrieval
    pub fn retrieval_query(&self) -> &str {
        self.topic_hint
            .as_deref()
            .unwrap_or_else(|| self.input_text.trim())
    }
}

// =============================================================================
// Result
// =============================================================================

/// Final artifact returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformResult {
    pub output_text: String,
    pub quality_score: f64,
    pub iterations: usize,
    pub mode: Mode,
    pub processing_time_ms: u64,
    pub metrics: QualityMetrics,
}
