//! Intentroot Core Library
//!
//! Hybrid intent resolution for agentic applications.
//!
//! # Features
//! - Rule, vector and language-model classifiers run concurrently
//! - Trust-weighted hybrid scoring with deterministic tie-breaks
//! - Multi-facet intent records with per-agent collection routing
//! - Fire-and-forget episodic memory with session-scoped recall
//! - Local SQLite vector index with brute-force cosine search

pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod intents;
pub mod llm;
pub mod memory;
pub mod resolver;
pub mod scorer;
pub mod types;

pub use classify::{LlmClassifier, RuleMatcher, SignalReport, SignalStatus, VectorClassifier};
pub use config::{
    CollectionRouting, Config, FacetCombination, LLMServiceConfig, RouteTarget, ScoringConfig,
    SourceWeights,
};
pub use db::Database;
pub use error::{Error, IntentRootError, Result};
pub use index::{
    FacetScorer, MetadataFilter, PointInsert, ScoredPoint, SearchRequest, SqliteVectorIndex,
    VectorIndex, VectorSchema, Vectors,
};
pub use intents::{train, IntentCatalog, IntentDefinition, IntentRegistry, IntentSnapshot};
pub use llm::{
    ClassificationContext, Embedder, HttpEmbedder, HttpIntentClassifier, IntentClassifier,
    LLMClient, LlmVerdict, VLLMClient,
};
pub use memory::{recall, MemoryWriter};
pub use resolver::{IntentResolver, Resolution, SignalCounters};
pub use scorer::{GroupScore, HybridScorer, ScoredDecision};
pub use types::{
    Candidate, Decision, EpisodicEntry, IntentRecord, Query, Role, SignalSource, FACET_CONTENT,
    FACET_DESCRIPTION, FACET_EXAMPLE, FACET_TITLE,
};

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "intentroot";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "intentroot";
