//! Supabase vector service and OpenAI embeddings
//!
//! Embedding queries go through the `match_human_content` RPC; text queries
//! read the `human_content` table filtered by content type.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedder, ExemplarRow, SearchQuery, VectorSearch};
use crate::ai::provider::{OPENAI_API_BASE, build_client, resolve_openai_key, validate_endpoint};
use crate::config::RetrievalConfig;
use crate::types::{HumaniseError, Mode, Result};

// =============================================================================
// Vector search
// =============================================================================

pub struct SupabaseVectorSearch {
    url: String,
    api_key: SecretString,
    match_function: String,
    table: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for SupabaseVectorSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseVectorSearch")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("match_function", &self.match_function)
            .field("table", &self.table)
            .finish()
    }
}

impl SupabaseVectorSearch {
    /// `None` when the project URL or key is not configured
    pub fn from_config(config: &RetrievalConfig) -> Result<Option<Self>> {
        let url = config
            .url
            .clone()
            .or_else(|| std::env::var("SUPABASE_URL").ok())
            .filter(|u| !u.trim().is_empty());
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("SUPABASE_KEY").ok())
            .filter(|k| !k.is_empty());

        let (Some(url), Some(api_key)) = (url, api_key) else {
            return Ok(None);
        };

        Ok(Some(Self {
            url: validate_endpoint(&url, "Supabase")?,
            api_key: SecretString::from(api_key),
            match_function: config.match_function.clone(),
            table: config.table.clone(),
            client: build_client(config.timeout_secs)?,
        }))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(self.api_key.expose_secret())
    }

    async fn read_rows(response: reqwest::Response) -> Result<Vec<ExemplarRow>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HumaniseError::retrieval(format!(
                "Supabase error ({}): {}",
                status, body
            )));
        }

        response
            .json::<Vec<ExemplarRow>>()
            .await
            .map_err(|e| HumaniseError::retrieval(format!("Invalid Supabase response: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct MatchRequest<'a> {
    query_embedding: &'a [f32],
    match_count: usize,
    content_type_filter: &'a str,
}

#[async_trait]
impl VectorSearch for SupabaseVectorSearch {
    async fn search(
        &self,
        query: &SearchQuery,
        content_type: Mode,
        k: usize,
    ) -> Result<Vec<ExemplarRow>> {
        let request = match query {
            SearchQuery::Embedding(embedding) => {
                debug!(function = %self.match_function, k, "Supabase vector match");
                let url = format!("{}/rest/v1/rpc/{}", self.url, self.match_function);
                self.client.post(url).json(&MatchRequest {
                    query_embedding: embedding,
                    match_count: k,
                    content_type_filter: content_type.as_str(),
                })
            }
            SearchQuery::Text(_) => {
                debug!(table = %self.table, k, "Supabase filtered query");
                let url = format!("{}/rest/v1/{}", self.url, self.table);
                self.client.get(url).query(&[
                    ("select", "content,content_type,topic".to_string()),
                    ("content_type", format!("eq.{}", content_type)),
                    ("limit", k.to_string()),
                ])
            }
        };

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| HumaniseError::retrieval(format!("Supabase request failed: {}", e)))?;

        Self::read_rows(response).await
    }
}

// =============================================================================
// Embeddings
// =============================================================================

pub struct OpenAiEmbedder {
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiEmbedder {
    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        Ok(Self {
            api_key: resolve_openai_key(config.embedding_api_key.clone())?,
            api_base: validate_endpoint(
                config
                    .embedding_api_base
                    .as_deref()
                    .unwrap_or(OPENAI_API_BASE),
                "OpenAI",
            )?,
            model: config.embedding_model.clone(),
            client: build_client(config.timeout_secs)?,
        })
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.api_base);
        let response = self
            .client
            .post(url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| HumaniseError::retrieval(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HumaniseError::retrieval(format!(
                "Embedding API error ({}): {}",
                status, body
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| HumaniseError::retrieval(format!("Invalid embedding response: {}", e)))?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| HumaniseError::retrieval("Embedding response had no data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RetrievalConfig {
        RetrievalConfig {
            url: Some("https://project.supabase.co/".to_string()),
            api_key: Some("service-key".to_string()),
            embedding_api_key: Some("sk-embed".to_string()),
            ..RetrievalConfig::default()
        }
    }

    #[test]
    fn test_from_config() {
        let search = SupabaseVectorSearch::from_config(&config()).unwrap().unwrap();
        assert_eq!(search.url, "https://project.supabase.co");
        assert_eq!(search.match_function, "match_human_content");
        assert_eq!(search.table, "human_content");
        assert!(!format!("{:?}", search).contains("service-key"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = RetrievalConfig {
            url: Some("ftp://project".to_string()),
            ..config()
        };
        assert!(SupabaseVectorSearch::from_config(&config).is_err());
    }

    #[test]
    fn test_match_request_shape() {
        let embedding = [0.5_f32, 0.25];
        let body = serde_json::to_value(MatchRequest {
            query_embedding: &embedding,
            match_count: 5,
            content_type_filter: "sales",
        })
        .unwrap();
        assert_eq!(body["match_count"], 5);
        assert_eq!(body["content_type_filter"], "sales");
        assert_eq!(body["query_embedding"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_row_deserialization_optional_fields() {
        let rows: Vec<ExemplarRow> = serde_json::from_str(
            r#"[{"content":"a","content_type":"sales"},
                {"content":"b","content_type":"journalist","topic":"council","similarity":0.82}]"#,
        )
        .unwrap();
        assert!(rows[0].similarity.is_none());
        assert_eq!(rows[1].topic.as_deref(), Some("council"));
    }

    #[test]
    fn test_embedder_from_config() {
        let embedder = OpenAiEmbedder::from_config(&config()).unwrap();
        assert_eq!(embedder.model, "text-embedding-3-small");
        assert_eq!(embedder.api_base, OPENAI_API_BASE);
    }
}
