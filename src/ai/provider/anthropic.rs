//! Anthropic API Provider
//!
//! LLM provider using the Anthropic Messages API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{
    ErrorClassifier, GenerationRequest, LlmProvider, LlmResponse, ProviderConfig,
    ResponseMetadata, ResponseTiming, TokenUsage, build_client, status_error, validate_endpoint,
};
use crate::types::{ErrorCategory, HumaniseError, LlmError, Result};

const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
pub(crate) const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Suffix appended to the system prompt for JSON requests; the Messages API
/// has no response_format switch.
const JSON_INSTRUCTION: &str = "Respond ONLY with a single valid JSON object, no explanation.";

pub struct AnthropicProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                HumaniseError::Config(
                    "Anthropic API key not found. Set ANTHROPIC_API_KEY env var or provide in config"
                        .to_string(),
                )
            })?;

        let api_base = validate_endpoint(
            config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE),
            "Anthropic",
        )?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: build_client(config.timeout_secs)?,
        })
    }

    fn build_request(&self, request: &GenerationRequest) -> MessagesRequest {
        let system = match (request.system.is_empty(), request.json_output) {
            (true, false) => None,
            (true, true) => Some(JSON_INSTRUCTION.to_string()),
            (false, false) => Some(request.system.clone()),
            (false, true) => Some(format!("{}\n\n{}", request.system, JSON_INSTRUCTION)),
        };

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: request.temperature.unwrap_or(self.temperature).min(1.0),
            system,
            messages: vec![Message {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse> {
        debug!(model = %self.model, json = request.json_output, "Generating with Anthropic");

        let start_time = Instant::now();
        let body = self.build_request(request);
        let url = format!("{}/messages", self.api_base);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, "anthropic"))?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            return Err(status_error(response, "anthropic").await);
        }

        let response_body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, "anthropic"))?;

        let content = response_body.text();
        if content.trim().is_empty() {
            return Err(LlmError::with_provider(
                ErrorCategory::ParseError,
                "No text content in Anthropic response",
                "anthropic",
            )
            .into());
        }

        let usage = response_body
            .usage
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        debug!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            elapsed_ms = elapsed.as_millis() as u64,
            "Anthropic response received"
        );

        Ok(LlmResponse {
            content,
            usage,
            timing: ResponseTiming::from_duration(elapsed),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: "anthropic".to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.api_base);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("Anthropic API is available");
                Ok(true)
            }
            Ok(resp) => {
                warn!("Anthropic API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Anthropic API check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: usize,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

impl MessagesResponse {
    /// Concatenated text blocks, ignoring other block types
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}
