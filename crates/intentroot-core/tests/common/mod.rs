//! Shared test doubles

#![allow(dead_code)]

use async_trait::async_trait;
use intentroot_core::config::{RuleConfig, RuleSetConfig};
use intentroot_core::{
    ClassificationContext, Config, Embedder, IntentClassifier, IntentRootError, LlmVerdict, Query,
    Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const DIMS: usize = 256;

/// Bag-of-words embedder: each lowercase word lands in a hashed bucket,
/// so texts sharing words are similar and disjoint texts are near-orthogonal
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIMS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            let mut hash: u64 = 0xcbf29ce484222325;
            for b in word.bytes() {
                hash ^= b as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            v[(hash % DIMS as u64) as usize] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model_name(&self) -> &str {
        "keyword-hash"
    }
}

/// Embedder that sleeps on the tokio clock before answering
pub struct SlowEmbedder(pub Duration);

#[async_trait]
impl Embedder for SlowEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        tokio::time::sleep(self.0).await;
        Ok(KeywordEmbedder::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tokio::time::sleep(self.0).await;
        Ok(texts.iter().map(|t| KeywordEmbedder::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model_name(&self) -> &str {
        "slow"
    }
}

/// What a classifier was shown for one call
#[derive(Debug, Clone)]
pub struct SeenContext {
    pub known_intents: Vec<String>,
    pub episodes: Vec<String>,
    pub prior_intent: Option<String>,
}

/// Classifier returning a fixed verdict after an optional delay
pub struct FixedClassifier {
    verdict: Option<LlmVerdict>,
    delay: Duration,
    pub seen: Mutex<Vec<SeenContext>>,
}

impl FixedClassifier {
    pub fn new(intent: &str, confidence: f64) -> Self {
        Self {
            verdict: Some(LlmVerdict {
                intent: intent.to_string(),
                confidence,
            }),
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn no_opinion() -> Self {
        Self {
            verdict: None,
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn last_seen(&self) -> Option<SeenContext> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl IntentClassifier for FixedClassifier {
    async fn classify(
        &self,
        _query: &Query,
        context: &ClassificationContext,
    ) -> Result<Option<LlmVerdict>> {
        self.seen.lock().unwrap().push(SeenContext {
            known_intents: context.known_intents.labels().map(String::from).collect(),
            episodes: context.episodes.iter().map(|e| e.text.clone()).collect(),
            prior_intent: context
                .prior_decision
                .as_ref()
                .and_then(|d| d.final_intent.clone()),
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.verdict.clone())
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

/// Classifier whose backend is always down
pub struct FailingClassifier;

#[async_trait]
impl IntentClassifier for FailingClassifier {
    async fn classify(
        &self,
        _query: &Query,
        _context: &ClassificationContext,
    ) -> Result<Option<LlmVerdict>> {
        Err(IntentRootError::ServiceUnavailable(
            "LLM service: connection refused".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

pub fn rule(intent: &str, phrases: &[&str]) -> RuleConfig {
    RuleConfig {
        intent: intent.to_string(),
        phrases: phrases.iter().map(|p| p.to_string()).collect(),
        patterns: Vec::new(),
    }
}

/// Config with every source disabled except rules; tests switch sources on
pub fn rules_only(rules: Vec<RuleConfig>) -> Config {
    let mut config = Config::default();
    config.rules = RuleSetConfig {
        confidence: 0.75,
        rules,
    };
    config.vector.enabled = false;
    config.llm_classifier.enabled = false;
    config.memory.enabled = false;
    config
}
