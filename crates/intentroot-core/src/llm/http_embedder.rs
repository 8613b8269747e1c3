//! Embedding Client over an OpenAI-compatible HTTP service

use super::{Embedder, LLMClient, VLLMClient};
use crate::config::LLMServiceConfig;
use crate::error::{IntentRootError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Embedder backed by an external `/v1/embeddings` endpoint
///
/// Returned vectors must match the configured width; a mismatch fails with
/// `InvalidVectorSize`.
pub struct HttpEmbedder {
    client: Arc<dyn LLMClient>,
}

impl HttpEmbedder {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    pub fn from_config(config: LLMServiceConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(VLLMClient::new(config)?)))
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Arc::new(VLLMClient::from_env()?)))
    }

    fn check(&self, embedding: &[f32]) -> Result<()> {
        let expected = self.client.embedding_dimensions();
        if embedding.len() != expected {
            return Err(IntentRootError::InvalidVectorSize {
                expected,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.client.embed(text).await?;
        self.check(&embedding)?;
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.client.embed_batch(texts).await?;
        for embedding in &embeddings {
            self.check(embedding)?;
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.client.embedding_dimensions()
    }

    fn model_name(&self) -> &str {
        self.client.model_name()
    }
}
