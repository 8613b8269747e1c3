//! Intent catalog, training and registry
//!
//! Training embeds each intent's named facets and upserts one
//! [`IntentRecord`] per definition into the routed collection. Query
//! handling never writes here; it reads [`IntentSnapshot`]s.

mod catalog;
mod registry;

pub use catalog::{IntentCatalog, IntentDefinition};
pub use registry::{IntentRegistry, IntentSnapshot, IntentSummary};

use crate::config::CollectionRouting;
use crate::db::vectors::mean_vector;
use crate::error::{IntentRootError, Result};
use crate::index::{PointInsert, VectorIndex, VectorSchema, Vectors};
use crate::llm::Embedder;
use crate::types::{IntentRecord, FACET_DESCRIPTION, FACET_EXAMPLE, FACET_TITLE};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::collections::BTreeSet;

/// Intents embedded at once during training
const EMBED_CONCURRENCY: usize = 4;

/// Outcome of one training run
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrainReport {
    pub trained: usize,
    pub collections: Vec<String>,
}

/// Embed one definition into a record with up to three facets
pub async fn embed_intent(embedder: &dyn Embedder, def: &IntentDefinition) -> Result<IntentRecord> {
    let mut texts = Vec::new();
    let title = non_blank(def.title.as_deref());
    let description = non_blank(def.description.as_deref());
    let examples: Vec<&str> = def
        .examples
        .iter()
        .map(String::as_str)
        .filter(|e| !e.trim().is_empty())
        .collect();

    if let Some(t) = title {
        texts.push(t.to_string());
    }
    if let Some(d) = description {
        texts.push(d.to_string());
    }
    texts.extend(examples.iter().map(|e| e.to_string()));

    if texts.is_empty() {
        return Err(IntentRootError::InvalidInput(format!(
            "Intent {} has nothing to embed",
            def.id
        )));
    }

    let mut embeddings = embedder.embed_batch(&texts).await?.into_iter();
    let mut record = IntentRecord::new(&def.id);
    record.metadata = def.metadata();

    if title.is_some() {
        record = record.with_facet(FACET_TITLE, next_embedding(&mut embeddings, &def.id)?);
    }
    if description.is_some() {
        record = record.with_facet(
            FACET_DESCRIPTION,
            next_embedding(&mut embeddings, &def.id)?,
        );
    }
    if !examples.is_empty() {
        let vectors: Vec<Vec<f32>> = embeddings.collect();
        let mean = mean_vector(&vectors).ok_or_else(|| {
            IntentRootError::Llm(format!("Example embeddings for {} are inconsistent", def.id))
        })?;
        record = record.with_facet(FACET_EXAMPLE, mean);
    }

    Ok(record)
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn next_embedding(iter: &mut impl Iterator<Item = Vec<f32>>, id: &str) -> Result<Vec<f32>> {
    iter.next()
        .ok_or_else(|| IntentRootError::Llm(format!("Missing embedding for intent {}", id)))
}

/// Embed and upsert the catalog
///
/// With `agent`, only definitions of that domain (or without one) are
/// trained and all of them route to that agent. Without it each definition
/// routes by its own domain.
pub async fn train(
    catalog: &IntentCatalog,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    routing: &CollectionRouting,
    agent: Option<&str>,
) -> Result<TrainReport> {
    let schema = VectorSchema::new(
        embedder.dimensions(),
        [FACET_TITLE, FACET_EXAMPLE, FACET_DESCRIPTION],
    );
    let mut ensured = BTreeSet::new();
    let mut report = TrainReport::default();

    let selected: Vec<&IntentDefinition> = catalog.for_agent(agent).collect();

    // Embedding dominates; upserts stay sequential and in catalog order
    let records: Vec<IntentRecord> = stream::iter(selected.iter().copied())
        .map(|def| embed_intent(embedder, def))
        .buffered(EMBED_CONCURRENCY)
        .try_collect()
        .await?;

    for (def, mut record) in selected.into_iter().zip(records) {
        let route_agent = agent.or(def.domain.as_deref());
        let target = routing.route(route_agent);

        if ensured.insert(target.collection.clone()) {
            index.ensure_collection(&target.collection, &schema).await?;
        }

        if let (CollectionRouting::Shared { filter_key, .. }, Some(a)) = (routing, route_agent) {
            record.metadata.insert(filter_key.clone(), a.into());
        }

        index
            .upsert(
                &target.collection,
                PointInsert {
                    id: record.id.clone(),
                    vectors: Vectors::Named(record.vectors),
                    payload: record.metadata,
                },
            )
            .await?;

        tracing::debug!(intent = %def.id, collection = %target.collection, "Trained intent");
        report.trained += 1;
    }

    report.collections = ensured.into_iter().collect();
    tracing::info!(
        trained = report.trained,
        collections = report.collections.len(),
        "Intent training complete"
    );
    Ok(report)
}
