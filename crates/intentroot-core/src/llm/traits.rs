//! LLM trait definitions

use crate::error::Result;
use crate::intents::IntentSnapshot;
use crate::types::{Decision, EpisodicEntry, Query};
use async_trait::async_trait;
use std::sync::Arc;

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for batch of texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Optional context handed to a language-model classifier
#[derive(Debug, Clone, Default)]
pub struct ClassificationContext {
    /// Labels the classifier may choose from
    pub known_intents: Arc<IntentSnapshot>,
    /// Nearest past episodes of the same session
    pub episodes: Vec<EpisodicEntry>,
    /// Decision made for the previous turn, if the caller tracks it
    pub prior_decision: Option<Decision>,
}

/// What a language model said about a query
#[derive(Debug, Clone, PartialEq)]
pub struct LlmVerdict {
    pub intent: String,
    pub confidence: f64,
}

/// Language-model intent classification
///
/// `Ok(None)` means the model had no opinion. Errors are contained by the
/// resolver and never reach the scorer.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        query: &Query,
        context: &ClassificationContext,
    ) -> Result<Option<LlmVerdict>>;

    /// Get model name
    fn model_name(&self) -> &str;
}
