//! Embeddings client for OpenAI-compatible endpoints

use crate::client::classify_transport_error;
use crate::config::LlmConfig;
use crate::types::{EmbeddingRequest, EmbeddingResponse, FailureKind, LlmFailure, LlmResult};
use async_trait::async_trait;

/// Inputs sent per request; several compatible providers cap batches at 10
pub const DEFAULT_EMBEDDING_BATCH: usize = 10;

/// Trait for turning texts into vectors (allows fakes in tests)
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed every input, returning vectors in input order
    async fn embed_batch(&self, inputs: &[String]) -> LlmResult<Vec<Vec<f32>>>;

    /// Embedding model identifier
    fn model_id(&self) -> String;
}

/// Embedder backed by `{base_url}/embeddings`
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    config: LlmConfig,
    http: reqwest::Client,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                LlmFailure::new(
                    FailureKind::Unexpected,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            config,
            http,
            batch_size: DEFAULT_EMBEDDING_BATCH,
        })
    }

    /// Set the number of inputs per request
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    async fn embed_chunk(&self, chunk: &[String]) -> LlmResult<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: chunk,
            encoding_format: "float",
        };

        let response = self
            .http
            .post(self.config.endpoint("embeddings"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmFailure::from_status(status.as_u16(), error_text));
        }

        let mut body: EmbeddingResponse = response.json().await.map_err(|e| {
            LlmFailure::new(
                FailureKind::Unexpected,
                format!("Failed to decode embeddings body: {}", e),
            )
        })?;

        if body.data.len() != chunk.len() {
            return Err(LlmFailure::new(
                FailureKind::UnexpectedShape,
                format!(
                    "Expected {} embeddings, got {}",
                    chunk.len(),
                    body.data.len()
                ),
            ));
        }

        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, inputs: &[String]) -> LlmResult<Vec<Vec<f32>>> {
        if self.config.api_key.trim().is_empty() {
            return Err(LlmFailure::missing_credential());
        }

        let mut vectors = Vec::with_capacity(inputs.len());
        for chunk in inputs.chunks(self.batch_size) {
            vectors.extend(self.embed_chunk(chunk).await?);
        }

        tracing::debug!(
            "Embedded {} inputs with {}",
            inputs.len(),
            self.config.embedding_model
        );
        Ok(vectors)
    }

    fn model_id(&self) -> String {
        self.config.embedding_model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_floor() {
        let embedder = OpenAiEmbedder::new(LlmConfig::new("sk"))
            .unwrap()
            .with_batch_size(0);
        assert_eq!(embedder.batch_size, 1);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let embedder = OpenAiEmbedder::new(LlmConfig::new("")).unwrap();
        let result = embedder.embed_batch(&["登录".to_string()]).await;
        assert_eq!(result.unwrap_err().kind, FailureKind::MissingCredential);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_request() {
        let embedder =
            OpenAiEmbedder::new(LlmConfig::new("sk").with_base_url("http://127.0.0.1:9")).unwrap();
        let vectors = embedder.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
