//! Nearest-intent lookup through the embedding and index clients

use crate::config::{CollectionRouting, VectorConfig};
use crate::error::{IntentRootError, Result};
use crate::index::{FacetScorer, ScoredPoint, SearchRequest, VectorIndex, Vectors};
use crate::llm::Embedder;
use crate::types::{Candidate, Query, SignalSource};
use std::sync::Arc;

/// Best match above the similarity floor, with the hits that produced it
#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub candidate: Candidate,
    pub hits: Vec<ScoredPoint>,
}

/// Embeds the query once and scores it against every facet of each record
pub struct VectorClassifier {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    routing: CollectionRouting,
    config: VectorConfig,
    scorer: FacetScorer,
}

impl VectorClassifier {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        routing: CollectionRouting,
        config: VectorConfig,
    ) -> Self {
        let scorer = FacetScorer::from_config(&config);
        Self {
            embedder,
            index,
            routing,
            config,
            scorer,
        }
    }

    pub fn threshold_for(&self, agent: Option<&str>) -> f64 {
        self.config.threshold_for(agent)
    }

    /// Fails with a configuration error when a routed intent collection does
    /// not exist, unless `allow_missing_collections` is set
    pub async fn check_collections<'a>(
        &self,
        agents: impl IntoIterator<Item = &'a str>,
    ) -> Result<()> {
        if self.config.allow_missing_collections {
            return Ok(());
        }
        for name in self.routing.collections_for(agents) {
            if self.index.collection_schema(&name).await?.is_none() {
                return Err(IntentRootError::Config(format!(
                    "Intent collection '{}' does not exist; train intents first or set vector.allow_missing_collections",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Candidate for the query, or `None` when nothing clears the threshold
    pub async fn classify(&self, query: &Query) -> Result<Option<Candidate>> {
        Ok(self.classify_detailed(query).await?.map(|m| m.candidate))
    }

    pub async fn classify_detailed(&self, query: &Query) -> Result<Option<VectorMatch>> {
        let agent = query.agent.as_deref();
        let target = self.routing.route(agent);
        let threshold = self.threshold_for(agent);

        let vector = self.embedder.embed(&query.text).await?;

        let request = SearchRequest::new(Vectors::Dense(vector), self.config.top_k)
            .with_filter(target.filter)
            .with_scorer(self.scorer.clone());

        let hits = match self.index.search(&target.collection, &request).await {
            Ok(hits) => hits,
            Err(IntentRootError::CollectionNotFound(name)) if self.config.allow_missing_collections => {
                tracing::debug!(collection = %name, "Intent collection missing; no vector opinion");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let best = match hits.first() {
            Some(best) => best,
            None => return Ok(None),
        };

        if best.score.is_nan() || best.score < threshold {
            tracing::debug!(
                intent = %best.id,
                score = best.score,
                threshold,
                "Best vector match below threshold"
            );
            return Ok(None);
        }

        let label = best
            .payload
            .get("intent")
            .and_then(|v| v.as_str())
            .unwrap_or(best.id.as_str())
            .to_string();

        Ok(Some(VectorMatch {
            candidate: Candidate::new(SignalSource::Vector, label, best.score),
            hits,
        }))
    }
}
