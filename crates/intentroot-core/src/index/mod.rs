//! Vector index client
//!
//! Provides:
//! - The [`VectorIndex`] trait (create collection, upsert, search, scroll)
//! - Named-vector requests and facet-weighted scoring
//! - Payload metadata filters
//! - A local SQLite-backed implementation

mod facets;
mod filter;
mod sqlite;

pub use facets::FacetScorer;
pub use filter::{FieldCondition, MetadataFilter};
pub use sqlite::SqliteVectorIndex;

use crate::error::Result;
use crate::types::Payload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vector layout declared when a collection is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorSchema {
    pub dimensions: usize,
    /// Named facets every point may carry
    pub facets: Vec<String>,
}

impl VectorSchema {
    pub fn new(dimensions: usize, facets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut facets: Vec<String> = facets.into_iter().map(Into::into).collect();
        facets.sort();
        facets.dedup();
        Self { dimensions, facets }
    }

    pub fn has_facet(&self, facet: &str) -> bool {
        self.facets.iter().any(|f| f == facet)
    }
}

/// A single vector or a set of named facet vectors
#[derive(Debug, Clone, PartialEq)]
pub enum Vectors {
    /// One vector; on upsert it needs a single-facet schema, on search it is
    /// compared against every facet of each point
    Dense(Vec<f32>),
    /// Facet name -> vector
    Named(BTreeMap<String, Vec<f32>>),
}

impl Vectors {
    pub fn named(facets: impl IntoIterator<Item = (impl Into<String>, Vec<f32>)>) -> Self {
        Vectors::Named(facets.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A point to write
#[derive(Debug, Clone)]
pub struct PointInsert {
    pub id: String,
    pub vectors: Vectors,
    pub payload: Payload,
}

/// Top-k search request
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub vectors: Vectors,
    pub top_k: usize,
    pub filter: Option<MetadataFilter>,
    /// Folds per-facet similarities into one score; `None` takes the best facet
    pub scorer: Option<FacetScorer>,
    /// Payload field holding an RFC 3339 timestamp; equal scores put the
    /// newest point first instead of ordering by id
    pub recency_key: Option<String>,
}

impl SearchRequest {
    pub fn new(vectors: Vectors, top_k: usize) -> Self {
        Self {
            vectors,
            top_k,
            filter: None,
            scorer: None,
            recency_key: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<MetadataFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_scorer(mut self, scorer: FacetScorer) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn with_recency_key(mut self, key: impl Into<String>) -> Self {
        self.recency_key = Some(key.into());
        self
    }
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPoint {
    pub id: String,
    /// Combined similarity
    pub score: f64,
    /// Raw cosine similarity per facet
    pub facet_scores: BTreeMap<String, f32>,
    pub payload: Payload,
}

/// A stored point without its vectors
#[derive(Debug, Clone, Serialize)]
pub struct StoredPoint {
    pub id: String,
    pub facets: Vec<String>,
    pub payload: Payload,
    pub created_at: String,
    pub updated_at: String,
}

/// Vector index operations used by classifiers, training and memory
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create a collection; fails with `CollectionExists` if the name is taken
    async fn create_collection(&self, name: &str, schema: &VectorSchema) -> Result<()>;

    /// Schema of a collection, `None` if it does not exist
    async fn collection_schema(&self, name: &str) -> Result<Option<VectorSchema>>;

    /// Insert or replace a point
    async fn upsert(&self, collection: &str, point: PointInsert) -> Result<()>;

    /// Ordered nearest points, at most `top_k`
    async fn search(&self, collection: &str, request: &SearchRequest) -> Result<Vec<ScoredPoint>>;

    /// Points matching a filter, ordered by id
    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&MetadataFilter>,
        limit: usize,
    ) -> Result<Vec<StoredPoint>>;

    /// Create the collection unless it already exists
    async fn ensure_collection(&self, name: &str, schema: &VectorSchema) -> Result<VectorSchema> {
        match self.collection_schema(name).await? {
            Some(existing) => Ok(existing),
            None => {
                self.create_collection(name, schema).await?;
                Ok(schema.clone())
            }
        }
    }
}
