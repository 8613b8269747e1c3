//! LLM integration
//!
//! Provides traits and implementations for:
//! - Embedding generation via external services (vLLM, OpenAI, etc.)
//! - Language-model intent classification

mod cache;
mod client;
mod http_classifier;
mod http_embedder;
mod traits;

pub use cache::{CacheStats, LLMCache};
pub use client::{ChatMessage, LLMClient, MetricsSnapshot, VLLMClient};
pub use http_classifier::HttpIntentClassifier;
pub use http_embedder::HttpEmbedder;
pub use traits::*;
