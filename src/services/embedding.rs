//! Client for an OpenAI/Jina-compatible embedding service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::tokens::TokenCounter;
use crate::error::EmbeddingError;
use crate::models::{EmbeddingConfig, EmbeddingTask};

/// Vectors for one batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingBatch {
    pub vectors: Vec<Vec<f32>>,
    /// Tokens consumed, when known
    pub tokens: Option<u64>,
}

/// Anything that turns texts into vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(
        &self,
        texts: &[String],
        task: EmbeddingTask,
    ) -> Result<EmbeddingBatch, EmbeddingError>;

    fn model(&self) -> &str;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let batch = self
            .embed(&[text.to_string()], EmbeddingTask::RetrievalQuery)
            .await?;
        batch
            .vectors
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }
}

/// Request body for `/v1/embeddings`.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<EmbeddingTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    truncate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_length: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u64,
}

/// Client for interacting with the embedding service.
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    truncate_dim: Option<u32>,
    max_length: u32,
    token_counter: Option<TokenCounter>,
}

impl EmbeddingClient {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let mut headers = HeaderMap::new();
        if let Some(ref key) = config.api_key {
            let auth = format!("Bearer {}", key.trim());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth)
                    .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        let token_counter = match config.tokenizer_path {
            Some(ref path) => Some(TokenCounter::from_file(path)?),
            None => None,
        };

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            truncate_dim: config.truncate_dim,
            max_length: config.max_length,
            token_counter,
        })
    }

    /// Check that the embedding service answers its health endpoint.
    pub async fn health_check(&self) -> Result<(), EmbeddingError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingError::ServerError(format!(
                "health check failed with status: {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Get the base URL of the embedding service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request<'a>(&'a self, texts: &'a [String], task: EmbeddingTask) -> EmbedRequest<'a> {
        EmbedRequest {
            model: &self.model,
            input: texts,
            task: Some(task),
            dimensions: self.truncate_dim,
            truncate: Some(true),
            max_length: Some(self.max_length),
        }
    }
}

/// Order the response by index, check its length and apply the
/// Matryoshka prefix.
fn into_vectors(
    mut response: EmbedResponse,
    expected: usize,
    truncate_dim: Option<u32>,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    response.data.sort_by_key(|entry| entry.index);
    if response.data.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "service returned {} embeddings for {} inputs",
            response.data.len(),
            expected
        )));
    }

    Ok(response
        .data
        .into_iter()
        .map(|entry| {
            let mut vector = entry.embedding;
            if let Some(dim) = truncate_dim {
                vector.truncate(dim as usize);
            }
            vector
        })
        .collect())
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(
        &self,
        texts: &[String],
        task: EmbeddingTask,
    ) -> Result<EmbeddingBatch, EmbeddingError> {
        if texts.is_empty() {
            return Ok(EmbeddingBatch::default());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&self.request(texts, task))
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
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let reported = parsed.usage.as_ref().map(|u| u.total_tokens);
        let vectors = into_vectors(parsed, texts.len(), self.truncate_dim)?;

        let tokens = match (reported, &self.token_counter) {
            (Some(tokens), _) => Some(tokens),
            (None, Some(counter)) => Some(counter.count(texts)?),
            (None, None) => None,
        };

        tracing::debug!(texts = texts.len(), ?tokens, "embedded batch");
        Ok(EmbeddingBatch { vectors, tokens })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
