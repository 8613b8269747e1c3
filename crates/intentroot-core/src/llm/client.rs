//! HTTP client for external LLM services (vLLM, OpenAI, etc.)

use super::cache::{chat_cache_key, embedding_cache_key, LLMCache};
use crate::config::LLMServiceConfig;
use crate::error::{IntentRootError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for LLM service clients
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate chat completion
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Generate embeddings for text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn embedding_dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// API metrics for monitoring
#[derive(Debug, Default)]
pub struct APIMetrics {
    pub total_requests: AtomicU64,
    pub total_errors: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub total_latency_ms: AtomicU64,
}

/// Snapshot of API metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub avg_latency_ms: f64,
}

/// vLLM/OpenAI-compatible client
pub struct VLLMClient {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
    embedding_dimensions: usize,
    cache: Arc<LLMCache>,
    metrics: Arc<APIMetrics>,
}

impl VLLMClient {
    /// Create new client from configuration
    pub fn new(config: LLMServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        // all-MiniLM-L6-v2 width unless configured
        let embedding_dimensions = config.embedding_dimensions.unwrap_or(384);

        Ok(Self {
            http_client,
            config,
            embedding_dimensions,
            cache: Arc::new(LLMCache::new()),
            metrics: Arc::new(APIMetrics::default()),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(LLMServiceConfig::default())
    }

    /// Get current API metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        let total = self.metrics.total_requests.load(Ordering::Relaxed);
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        MetricsSnapshot {
            total_requests: total,
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate: if lookups > 0 {
                hits as f64 / lookups as f64 * 100.0
            } else {
                0.0
            },
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    fn record_error(&self) {
        self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_latency(&self, start: Instant) {
        self.metrics
            .total_latency_ms
            .fetch_add(start.elapsed().as_millis() as u64, Ordering::Relaxed);
    }

    async fn post_json<T, R>(&self, service: &str, url: &str, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized + Sync,
        R: serde::de::DeserializeOwned,
    {
        let start = Instant::now();
        let mut req = self.http_client.post(url).json(body);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await.map_err(|e| {
            self.record_error();
            transport_error(service, e, start)
        })?;

        let status = response.status();
        if !status.is_success() {
            self.record_error();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(service, status, &body));
        }

        response.json().await.map_err(|e| {
            self.record_error();
            IntentRootError::Llm(format!("{} returned an unreadable body: {}", service, e))
        })
    }
}

fn transport_error(service: &str, e: reqwest::Error, start: Instant) -> IntentRootError {
    if e.is_timeout() {
        IntentRootError::Timeout {
            service: service.to_string(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    } else {
        IntentRootError::ServiceUnavailable(format!("{}: {}", service, e))
    }
}

fn status_error(service: &str, status: reqwest::StatusCode, body: &str) -> IntentRootError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        IntentRootError::RateLimited(format!("{} (HTTP {})", service, status.as_u16()))
    } else {
        IntentRootError::ServiceUnavailable(format!(
            "{} error (HTTP {}): {}",
            service,
            status.as_u16(),
            body
        ))
    }
}

#[async_trait]
impl LLMClient for VLLMClient {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let messages_json = serde_json::to_string(&messages)?;
        let cache_key = chat_cache_key(&self.config.model, &messages_json);

        if let Some(cached) = self.cache.get(&cache_key) {
            tracing::debug!("Cache hit for chat completion");
            self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }
        self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatMessage,
        }

        // Classification wants the most likely label, not variety
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: 0.0,
            max_tokens: 128,
        };

        let url = format!("{}/v1/chat/completions", self.config.url);
        let chat_response: ChatResponse = self.post_json("LLM service", &url, &request).await?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                self.record_error();
                IntentRootError::Llm("No response from LLM".to_string())
            })?
            .message
            .content;

        self.cache.set(cache_key, content.clone());
        self.record_latency(start);
        Ok(content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| IntentRootError::Llm("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut uncached_texts = Vec::new();
        let mut uncached_indices = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let cache_key = embedding_cache_key(&self.config.embedding_model, text);
            if let Some(embedding) = self
                .cache
                .get(&cache_key)
                .and_then(|cached| serde_json::from_str::<Vec<f32>>(&cached).ok())
            {
                results.push(Some(embedding));
                self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
            results.push(None);
            uncached_texts.push(text.clone());
            uncached_indices.push(i);
        }

        if !uncached_texts.is_empty() {
            tracing::debug!(
                cached = texts.len() - uncached_texts.len(),
                fetching = uncached_texts.len(),
                "Embedding batch"
            );

            #[derive(Serialize)]
            struct EmbedRequest<'a> {
                model: &'a str,
                input: &'a [String],
            }

            #[derive(Deserialize)]
            struct EmbedResponse {
                data: Vec<EmbedData>,
            }

            #[derive(Deserialize)]
            struct EmbedData {
                embedding: Vec<f32>,
            }

            let request = EmbedRequest {
                model: &self.config.embedding_model,
                input: &uncached_texts,
            };
            let url = format!("{}/v1/embeddings", self.config.embeddings_url());
            let embed_response: EmbedResponse =
                self.post_json("Embedding service", &url, &request).await?;

            if embed_response.data.len() != uncached_texts.len() {
                self.record_error();
                return Err(IntentRootError::Llm(format!(
                    "Embedding service returned {} vectors for {} inputs",
                    embed_response.data.len(),
                    uncached_texts.len()
                )));
            }

            for ((idx, text), data) in uncached_indices
                .iter()
                .zip(&uncached_texts)
                .zip(embed_response.data)
            {
                if let Ok(json) = serde_json::to_string(&data.embedding) {
                    self.cache
                        .set(embedding_cache_key(&self.config.embedding_model, text), json);
                }
                results[*idx] = Some(data.embedding);
            }
        }

        self.record_latency(start);
        Ok(results.into_iter().flatten().collect())
    }

    fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
