//! LLM Provider Abstraction
//!
//! Defines the LlmProvider trait for plain-text and JSON generation.
//! All providers return `LlmResponse` with token usage and timing.
//!
//! ## Adapters
//!
//! - `anthropic`: Messages API (default rewriter backend)
//! - `openai`: Chat Completions API (default judge backend)
//! - `ollama`: local `/api/generate`

mod anthropic;
mod ollama;
mod openai;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub(crate) use openai::{DEFAULT_API_BASE as OPENAI_API_BASE, resolve_api_key as resolve_openai_key};

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::types::{HumaniseError, Result};

// =============================================================================
// Generation Request
// =============================================================================

/// A single generation call: system instructions plus the user prompt
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    /// Ask the backend for a JSON object instead of free text
    pub json_output: bool,
    /// Overrides the provider's configured temperature
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            json_output: false,
            temperature: None,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_output = true;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

// =============================================================================
// LLM Response with Usage Metrics
// =============================================================================

/// Complete LLM response including content and usage metrics
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text, as returned by the backend
    pub content: String,
    pub usage: TokenUsage,
    pub timing: ResponseTiming,
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Create response with content only (usage unknown)
    pub fn content_only(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Wall clock time of the HTTP round trip
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

/// Response metadata
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub model: String,
    pub provider: String,
}

/// Shared LLM provider type for concurrent access across requests.
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for one LLM profile
///
/// API keys are never serialized and are redacted in debug output. Each
/// provider converts the key to SecretString internally.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider type: "anthropic", "openai", "ollama"
    pub provider: String,
    /// Model name (provider-specific); `None` uses the adapter default
    pub model: Option<String>,
    pub timeout_secs: u64,
    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,
    pub max_tokens: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: None,
            timeout_secs: crate::constants::network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.7,
            api_key: None,
            api_base: None,
            max_tokens: 2000,
        }
    }
}

impl ProviderConfig {
    /// Profile used for the external quality judge
    pub fn judge_default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: Some("gpt-4o-mini".to_string()),
            timeout_secs: crate::constants::network::JUDGE_TIMEOUT_SECS,
            temperature: 0.3,
            max_tokens: 500,
            ..Self::default()
        }
    }

    /// Model name with the adapter default filled in
    pub fn resolved_model(&self) -> &str {
        match (&self.model, self.provider.as_str()) {
            (Some(model), _) => model,
            (None, "openai") => openai::DEFAULT_MODEL,
            (None, "ollama") => ollama::DEFAULT_MODEL,
            (None, _) => anthropic::DEFAULT_MODEL,
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// LLM Provider trait with usage metrics
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for `request`
    ///
    /// Providers fail rather than return an empty body.
    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(config.clone())?)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone())?)),
        _ => Err(HumaniseError::Config(format!(
            "Unknown provider: {}. Supported: anthropic, openai, ollama",
            config.provider
        ))),
    }
}

/// Validate a provider endpoint URL
///
/// Only http/https schemes are accepted. The trailing slash is removed.
pub(crate) fn validate_endpoint(endpoint: &str, provider: &str) -> Result<String> {
    let url = url::Url::parse(endpoint).map_err(|e| {
        HumaniseError::Config(format!(
            "Invalid {} endpoint URL '{}': {}",
            provider, endpoint, e
        ))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(HumaniseError::Config(format!(
            "{} endpoint must use http or https scheme, got: {}",
            provider,
            url.scheme()
        )));
    }

    let mut result = url.to_string();
    if result.ends_with('/') {
        result.pop();
    }
    Ok(result)
}

/// Build the HTTP client shared by all adapters
pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(
            crate::constants::network::CONNECTION_TIMEOUT_SECS,
        ))
        .build()
        .map_err(|e| HumaniseError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success HTTP response into a classified provider error
pub(crate) async fn status_error(response: reqwest::Response, provider: &str) -> HumaniseError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = format!("{} API error ({}): {}", provider, status, truncate(&body, 500));
    ErrorClassifier::classify_http_status(status.as_u16(), &message, provider).into()
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
