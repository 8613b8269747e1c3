//! Configuration management
//!
//! Loaded once at startup into an immutable [`Config`] and shared read-only.
//! [`Config::validate`] must pass before any query is served.

pub mod routing;

pub use routing::{CollectionRouting, RouteTarget};

use crate::error::{IntentRootError, Result};
use crate::types::{SignalSource, FACET_DESCRIPTION, FACET_EXAMPLE, FACET_TITLE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Hybrid scorer weights
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Rule matcher triggers
    #[serde(default)]
    pub rules: RuleSetConfig,

    /// Vector classifier settings
    #[serde(default)]
    pub vector: VectorConfig,

    /// Language-model classifier settings
    #[serde(default)]
    pub llm_classifier: LlmClassifierConfig,

    /// Where intent records live
    #[serde(default)]
    pub routing: CollectionRouting,

    /// Episodic memory settings
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the LLM service for chat/completions
    pub url: String,

    /// Model name for chat completions (intent classification)
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("INTENTROOT_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            model: default_chat_model(),
            embedding_url: std::env::var("INTENTROOT_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("INTENTROOT_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok()),
            api_key: std::env::var("INTENTROOT_LLM_API_KEY").ok(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("INTENTROOT_LLM_MODEL")
        .unwrap_or_else(|_| "meta-llama/Llama-3.1-8B-Instruct".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("INTENTROOT_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "sentence-transformers/all-MiniLM-L6-v2".to_string())
}

fn default_timeout() -> u64 {
    30
}

/// Per-source trust weights for the hybrid scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceWeights {
    pub rule: f64,
    pub vector: f64,
    pub llm: f64,
}

impl SourceWeights {
    pub fn get(&self, source: SignalSource) -> f64 {
        match source {
            SignalSource::Rule => self.rule,
            SignalSource::Vector => self.vector,
            SignalSource::Llm => self.llm,
        }
    }
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            rule: 0.6,
            vector: 1.0,
            llm: 1.2,
        }
    }
}

/// Hybrid scorer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub source_weights: SourceWeights,

    /// Two group scores closer than this are a tie
    #[serde(default = "default_tie_epsilon")]
    pub tie_epsilon: f64,
}

fn default_tie_epsilon() -> f64 {
    1e-6
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            source_weights: SourceWeights::default(),
            tie_epsilon: default_tie_epsilon(),
        }
    }
}

/// One rule: any phrase or pattern maps the query to `intent`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub intent: String,

    /// Exact phrases (case-insensitive, whitespace-normalized containment)
    #[serde(default)]
    pub phrases: Vec<String>,

    /// Regular expressions (compiled case-insensitive)
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Rule matcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetConfig {
    /// Fixed confidence assigned to every rule match
    #[serde(default = "default_rule_confidence")]
    pub confidence: f64,

    /// Evaluated in order; first match wins
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_rule_confidence() -> f64 {
    0.75
}

impl Default for RuleSetConfig {
    fn default() -> Self {
        Self {
            confidence: default_rule_confidence(),
            rules: Vec::new(),
        }
    }
}

/// How per-facet similarities fold into one score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FacetCombination {
    /// `Σ wᶠ·sᶠ / Σ wᶠ`
    #[default]
    WeightedSum,
    /// `max (wᶠ / w_max)·sᶠ`
    WeightedMax,
}

/// Vector classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum similarity floor; weaker matches are discarded
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Per-agent overrides of `similarity_threshold`
    #[serde(default)]
    pub agent_thresholds: BTreeMap<String, f64>,

    /// Facet name -> weight
    #[serde(default = "default_facet_weights")]
    pub facet_weights: BTreeMap<String, f64>,

    #[serde(default)]
    pub combination: FacetCombination,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Budget for embedding plus index search
    #[serde(default = "default_vector_timeout_ms")]
    pub timeout_ms: u64,

    /// Serve queries while routed intent collections are still untrained;
    /// a missing collection then yields no vector opinion
    #[serde(default)]
    pub allow_missing_collections: bool,
}

fn default_true() -> bool {
    true
}

fn default_similarity_threshold() -> f64 {
    0.78
}

fn default_facet_weights() -> BTreeMap<String, f64> {
    BTreeMap::from([
        (FACET_TITLE.to_string(), 0.5),
        (FACET_EXAMPLE.to_string(), 1.0),
        (FACET_DESCRIPTION.to_string(), 0.7),
    ])
}

fn default_top_k() -> usize {
    5
}

fn default_vector_timeout_ms() -> u64 {
    500
}

impl VectorConfig {
    /// Threshold for an agent, falling back to the global one
    pub fn threshold_for(&self, agent: Option<&str>) -> f64 {
        agent
            .and_then(|a| self.agent_thresholds.get(a).copied())
            .unwrap_or(self.similarity_threshold)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Facet names in stable order
    pub fn facets(&self) -> Vec<String> {
        self.facet_weights.keys().cloned().collect()
    }
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            similarity_threshold: default_similarity_threshold(),
            agent_thresholds: BTreeMap::new(),
            facet_weights: default_facet_weights(),
            combination: FacetCombination::default(),
            top_k: default_top_k(),
            timeout_ms: default_vector_timeout_ms(),
            allow_missing_collections: false,
        }
    }
}

/// Language-model classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmClassifierConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,

    /// Past episodes passed as context (0 disables recall)
    #[serde(default = "default_recall_depth")]
    pub recall_depth: usize,
}

fn default_llm_timeout_ms() -> u64 {
    1500
}

fn default_recall_depth() -> usize {
    3
}

impl LlmClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for LlmClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: default_llm_timeout_ms(),
            recall_depth: default_recall_depth(),
        }
    }
}

/// Episodic memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_memory_collection")]
    pub collection: String,
}

fn default_memory_collection() -> String {
    "episodic_memory".to_string()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            collection: default_memory_collection(),
        }
    }
}

impl Config {
    /// Load config from `INTENTROOT_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("INTENTROOT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self::load_from(&path)
    }

    /// Load config from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_yaml(&content)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Reject configurations the system must not serve queries with
    pub fn validate(&self) -> Result<()> {
        let weights = &self.scoring.source_weights;
        for source in SignalSource::ALL {
            check_weight(&format!("scoring.source_weights.{}", source), weights.get(source))?;
        }
        if !self.scoring.tie_epsilon.is_finite() || self.scoring.tie_epsilon < 0.0 {
            return Err(config_error("scoring.tie_epsilon must be a non-negative number"));
        }

        check_unit("rules.confidence", self.rules.confidence)?;
        for (i, rule) in self.rules.rules.iter().enumerate() {
            if rule.intent.trim().is_empty() {
                return Err(config_error(&format!("rules[{}] has an empty intent", i)));
            }
            if rule.phrases.is_empty() && rule.patterns.is_empty() {
                return Err(config_error(&format!(
                    "rules[{}] ({}) has no phrases or patterns",
                    i, rule.intent
                )));
            }
            if rule.phrases.iter().any(|p| p.trim().is_empty()) {
                return Err(config_error(&format!(
                    "rules[{}] ({}) has an empty phrase",
                    i, rule.intent
                )));
            }
            for pattern in &rule.patterns {
                regex::Regex::new(pattern).map_err(|e| {
                    config_error(&format!(
                        "rules[{}] ({}) has malformed pattern '{}': {}",
                        i, rule.intent, pattern, e
                    ))
                })?;
            }
        }

        check_unit("vector.similarity_threshold", self.vector.similarity_threshold)?;
        for (agent, threshold) in &self.vector.agent_thresholds {
            check_unit(&format!("vector.agent_thresholds.{}", agent), *threshold)?;
        }
        if self.vector.facet_weights.is_empty() {
            return Err(config_error("vector.facet_weights must name at least one facet"));
        }
        for (facet, weight) in &self.vector.facet_weights {
            check_weight(&format!("vector.facet_weights.{}", facet), *weight)?;
        }
        if self.vector.facet_weights.values().all(|w| *w == 0.0) {
            return Err(config_error("vector.facet_weights needs at least one positive weight"));
        }
        if self.vector.top_k == 0 {
            return Err(config_error("vector.top_k must be at least 1"));
        }
        if self.vector.timeout_ms == 0 {
            return Err(config_error("vector.timeout_ms must be positive"));
        }
        if self.llm_classifier.timeout_ms == 0 {
            return Err(config_error("llm_classifier.timeout_ms must be positive"));
        }

        self.routing.validate()?;

        if self.memory.collection.trim().is_empty() {
            return Err(config_error("memory.collection must not be empty"));
        }

        Ok(())
    }
}

fn check_weight(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(config_error(&format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(config_error(&format!("{} must be in [0, 1], got {}", name, value)));
    }
    Ok(())
}

fn config_error(msg: &str) -> IntentRootError {
    IntentRootError::Config(msg.to_string())
}
