//! Ollama Local LLM Provider
//!
//! LLM provider for locally-running Ollama models.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{
    GenerationRequest, LlmProvider, LlmResponse, ProviderConfig, ResponseMetadata, ResponseTiming,
    TokenUsage, build_client, status_error, validate_endpoint,
};
use crate::types::{ErrorCategory, LlmError, Result};

const DEFAULT_API_BASE: &str = "http://localhost:11434";
pub(crate) const DEFAULT_MODEL: &str = "llama3:latest";

/// Ollama Local LLM Provider
#[derive(Debug)]
pub struct OllamaProvider {
    api_base: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_base = validate_endpoint(
            config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE),
            "Ollama",
        )?;

        if let Ok(url) = url::Url::parse(&api_base)
            && let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        Ok(Self {
            api_base,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            client: build_client(config.timeout_secs)?,
        })
    }

    fn build_request(&self, request: &GenerationRequest) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            system: (!request.system.is_empty()).then(|| request.system.clone()),
            prompt: request.prompt.clone(),
            stream: false,
            options: Some(OllamaOptions {
                temperature: request.temperature.unwrap_or(self.temperature),
            }),
            format: request.json_output.then(|| "json".to_string()),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse> {
        debug!(model = %self.model, json = request.json_output, "Generating with Ollama");

        let start_time = Instant::now();
        let body = self.build_request(request);
        let url = format!("{}/api/generate", self.api_base);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::with_provider(
                        ErrorCategory::Network,
                        format!(
                            "Failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                            self.api_base
                        ),
                        "ollama",
                    )
                } else {
                    super::ErrorClassifier::classify_transport(&e, "ollama")
                }
            })?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            return Err(status_error(response, "ollama").await);
        }

        let response_body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| super::ErrorClassifier::classify_transport(&e, "ollama"))?;

        if response_body.response.trim().is_empty() {
            return Err(LlmError::with_provider(
                ErrorCategory::ParseError,
                "Empty response from Ollama",
                "ollama",
            )
            .into());
        }

        let usage = TokenUsage::new(
            response_body.prompt_eval_count.unwrap_or(0),
            response_body.eval_count.unwrap_or(0),
        );

        Ok(LlmResponse {
            content: response_body.response,
            usage,
            timing: ResponseTiming::from_duration(elapsed),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: "ollama".to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.api_base);

        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let Ok(tags) = resp.json::<OllamaTagsResponse>().await else {
                    info!("Ollama is available");
                    return Ok(true);
                };

                let base = self.model.trim_end_matches(":latest");
                if tags
                    .models
                    .iter()
                    .any(|m| m.name == self.model || m.name.starts_with(base))
                {
                    info!("Ollama is available with model: {}", self.model);
                    Ok(true)
                } else {
                    warn!(
                        "Ollama is running but model '{}' not found. Pull with: ollama pull {}",
                        self.model, self.model
                    );
                    Ok(false)
                }
            }
            Ok(resp) => {
                warn!("Ollama API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Ollama not available: {}. Start with: ollama serve", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig {
            provider: "ollama".to_string(),
            ..Default::default()
        };

        let provider = OllamaProvider::new(config).expect("Failed to create provider");
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
        assert_eq!(provider.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let config = ProviderConfig {
            provider: "ollama".to_string(),
            api_base: Some("file:///etc/passwd".to_string()),
            ..Default::default()
        };
        assert!(OllamaProvider::new(config).is_err());
    }

    #[test]
    fn test_request_shape() {
        let provider = OllamaProvider::new(ProviderConfig {
            provider: "ollama".to_string(),
            ..Default::default()
        })
        .unwrap();

        let body =
            serde_json::to_value(provider.build_request(&GenerationRequest::new("sys", "go")))
                .unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["system"], "sys");
        assert!(body.get("format").is_none());

        let body = serde_json::to_value(
            provider.build_request(&GenerationRequest::new("", "go").json()),
        )
        .unwrap();
        assert_eq!(body["format"], "json");
        assert!(body.get("system").is_none());
    }
}
