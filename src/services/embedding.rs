//! Embedding client for generating text embeddings.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;
use crate::utils::retry::{RetryConfig, with_retry};

/// Turns text into vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed document chunks, one vector per input, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_documents(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }
}

/// Request body for the /embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response from the /embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
    index: usize,
}

/// Client for an OpenAI-compatible embedding API.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddings {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    batch_size: usize,
    retry: RetryConfig,
}

impl OpenAiEmbeddings {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &EmbeddingConfig, api_key: Option<String>) -> Result<Self, EmbeddingError> {
        let api_key = api_key.ok_or(EmbeddingError::MissingApiKey)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            batch_size: config.batch_size.max(1) as usize,
            retry: RetryConfig::with_retries(config.max_retries),
        })
    }

    /// Get the base URL of the embedding API.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Internal method to embed a single batch.
    async fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else if e.is_connect() {
                    EmbeddingError::ConnectionError(e.to_string())
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError { status, body });
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        order_embeddings(embed_response.data, texts.len())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let started = std::time::Instant::now();
            let embeddings =
                with_retry(&self.retry, "embeddings", || self.embed_single_batch(batch)).await?;
            tracing::debug!(
                inputs = batch.len(),
                latency_ms = started.elapsed().as_millis() as u64,
                "embedded batch"
            );
            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }
}

/// Put response rows back into request order and check that none are missing.
fn order_embeddings(
    mut data: Vec<EmbedData>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if data.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }

    data.sort_by_key(|d| d.index);
    if data.iter().enumerate().any(|(i, d)| d.index != i) {
        return Err(EmbeddingError::InvalidResponse(
            "embedding indices are not contiguous".to_string(),
        ));
    }

    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        let config = EmbeddingConfig::default();
        assert!(matches!(
            OpenAiEmbeddings::new(&config, None),
            Err(EmbeddingError::MissingApiKey)
        ));
        assert!(OpenAiEmbeddings::new(&config, Some("sk-test".to_string())).is_ok());
    }

    #[test]
    fn test_max_retries_allows_that_many_retries() {
        let config = EmbeddingConfig {
            max_retries: 0,
            ..Default::default()
        };
        let client = OpenAiEmbeddings::new(&config, Some("key".to_string())).unwrap();
        assert_eq!(client.retry.max_attempts, 1);
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        };
        let client = OpenAiEmbeddings::new(&config, Some("key".to_string())).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_order_embeddings_restores_request_order() {
        let data = vec![
            EmbedData {
                embedding: vec![2.0],
                index: 1,
            },
            EmbedData {
                embedding: vec![1.0],
                index: 0,
            },
        ];
        let ordered = order_embeddings(data, 2).unwrap();
        assert_eq!(ordered, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_order_embeddings_rejects_missing_rows() {
        let data = vec![EmbedData {
            embedding: vec![1.0],
            index: 0,
        }];
        assert!(matches!(
            order_embeddings(data, 2),
            Err(EmbeddingError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_response_body() {
        let body = r#"{"object":"list","data":[{"object":"embedding","embedding":[0.1,0.2],"index":0}],"model":"text-embedding-ada-002"}"#;
        let parsed: EmbedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, 0.2]);
    }
}
