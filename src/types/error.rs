//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Separates request-level failures (validation, exhaustion, cancellation)
//! from collaborator failures that the orchestrator absorbs.
//!
//! ## Error Categories
//!
//! Provider failures carry an `ErrorCategory` derived from the HTTP status or
//! transport error, so logs and failure reasons say what went wrong.
//!
//! ## Propagation
//!
//! Only `Validation`, `Pipeline` and `Cancelled` leave the orchestrator.
//! `Generation`, `Retrieval`, `Llm` and `Timeout` are recorded and absorbed
//! while attempts remain.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories for provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - wait then retry same provider
    RateLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity issues - retry with backoff
    Network,
    /// Provider unavailable
    Unavailable,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Parsing provider response failed
    ParseError,
    /// Temporary server issues - retry same provider
    Transient,
    /// Unknown error - conservative retry
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Structured provider error with category
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for routing decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps transport-level failures onto categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify HTTP status code directly
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            400 | 422 => LlmError::with_provider(ErrorCategory::BadRequest, message, provider),
            500 | 502 | 503 | 504 | 529 => {
                LlmError::with_provider(ErrorCategory::Transient, message, provider)
            }
            404 => LlmError::with_provider(ErrorCategory::Unavailable, message, provider),
            _ => LlmError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }

    /// Classify a reqwest transport error
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> LlmError {
        let category = if err.is_timeout() || err.is_connect() {
            ErrorCategory::Network
        } else if err.is_decode() {
            ErrorCategory::ParseError
        } else if let Some(status) = err.status() {
            return Self::classify_http_status(status.as_u16(), &err.to_string(), provider);
        } else {
            ErrorCategory::Unknown
        };
        LlmError::with_provider(category, err.to_string(), provider)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Structured validation error with context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What validation failed
    pub kind: ValidationErrorKind,
    /// Field that failed validation
    pub field: Option<String>,
    /// Detailed message
    pub message: String,
    /// Expected value or format
    pub expected: Option<String>,
    /// Actual value received
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "Validation failed for '{}': {}", field, self.message)?;
        } else {
            write!(f, "Validation failed: {}", self.message)?;
        }
        if let (Some(expected), Some(actual)) = (&self.expected, &self.actual) {
            write!(f, " (expected {}, got {})", expected, actual)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_comparison(
        mut self,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}

/// Validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Input text is empty or whitespace
    Empty,
    /// Input text below the minimum length
    TooShort,
    /// Input text above the maximum length
    TooLong,
    /// Unknown transformation mode
    InvalidMode,
    /// Value out of range
    Range,
    /// General validation error
    General,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum HumaniseError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Request Errors (surface to the caller)
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Validation(ValidationError),

    /// No attempt produced a usable rewrite
    #[error("Pipeline failed after {attempts} attempt(s): {message}")]
    Pipeline { attempts: usize, message: String },

    #[error("Request cancelled")]
    Cancelled,

    // -------------------------------------------------------------------------
    // Collaborator Errors (absorbed by the orchestrator)
    // -------------------------------------------------------------------------
    /// A single rewrite attempt failed
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("LLM error: {0}")]
    Llm(LlmError),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Config error: {0}")]
    Config(String),
}

impl From<LlmError> for HumaniseError {
    fn from(err: LlmError) -> Self {
        HumaniseError::Llm(err)
    }
}

impl From<ValidationError> for HumaniseError {
    fn from(err: ValidationError) -> Self {
        HumaniseError::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, HumaniseError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl HumaniseError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval(message.into())
    }

    /// Stable tag for upward consumers (API layer, CLI exit reporting)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Pipeline { .. } => "pipeline_error",
            Self::Cancelled => "cancellation_error",
            Self::Generation(_) => "generation_error",
            Self::Llm(_) => "provider_error",
            Self::Retrieval(_) => "retrieval_error",
            Self::Timeout { .. } => "timeout_error",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
