//! OpenAI API Provider
//!
//! LLM provider using OpenAI's Chat Completions API.

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

pub(crate) const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub(crate) const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = resolve_api_key(config.api_key.clone())?;

        let api_base = validate_endpoint(
            config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE),
            "OpenAI",
        )?;

        let model = config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            api_base,
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: build_client(config.timeout_secs)?,
        })
    }

    fn build_request(&self, request: &GenerationRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: request.system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: Some(self.max_tokens),
            response_format: request.json_output.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

/// Read the OpenAI key from config or `OPENAI_API_KEY`
pub(crate) fn resolve_api_key(configured: Option<String>) -> Result<SecretString> {
    configured
        .filter(|key| !key.is_empty())
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|key| !key.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            HumaniseError::Config(
                "OpenAI API key not found. Set OPENAI_API_KEY env var or provide in config"
                    .to_string(),
            )
        })
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse> {
        debug!(
            model = %self.model,
            json = request.json_output,
            "Generating with OpenAI"
        );

        let start_time = Instant::now();
        let body = self.build_request(request);
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, "openai"))?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            return Err(status_error(response, "openai").await);
        }

        let response_body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, "openai"))?;

        let usage = response_body
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let content = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                LlmError::with_provider(
                    ErrorCategory::ParseError,
                    "No content in OpenAI response",
                    "openai",
                )
            })?;

        debug!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            elapsed_ms = elapsed.as_millis() as u64,
            "OpenAI response received"
        );

        Ok(LlmResponse {
            content,
            usage,
            timing: ResponseTiming::from_duration(elapsed),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: "openai".to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.api_base);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("OpenAI API is available");
                Ok(true)
            }
            Ok(resp) => {
                warn!("OpenAI API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("OpenAI API check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(ProviderConfig {
            provider: "openai".to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        })
        .expect("provider")
    }

    #[test]
    fn test_defaults() {
        let provider = provider();
        assert_eq!(provider.model, DEFAULT_MODEL);
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", provider());
        assert!(!debug.contains("sk-test"));
    }

    #[test]
    fn test_text_request_has_no_response_format() {
        let request = GenerationRequest::new("be human", "rewrite this");
        let body = serde_json::to_value(provider().build_request(&request)).unwrap();
        assert!(body.get("response_format").is_none());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "rewrite this");
    }

    #[test]
    fn test_json_request_and_temperature_override() {
        let request = GenerationRequest::new("", "rate it").json().with_temperature(0.1);
        let body = serde_json::to_value(provider().build_request(&request)).unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }
}
