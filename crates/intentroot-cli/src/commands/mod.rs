//! CLI command handlers

pub mod collection;
pub mod config;
pub mod intent;
pub mod memory;
pub mod resolve;
pub mod rules;
pub mod score;
pub mod status;

use intentroot_core::{LLMClient, LLMServiceConfig, VLLMClient};
use std::sync::Arc;

/// One HTTP client shared by the embedder and the classifier, so both use
/// the same response cache
pub(crate) fn llm_client(config: &LLMServiceConfig) -> anyhow::Result<Arc<dyn LLMClient>> {
    Ok(Arc::new(VLLMClient::new(config.clone())?))
}

pub(crate) fn join_query(words: &[String]) -> String {
    words.join(" ")
}
