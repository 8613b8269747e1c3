//! Session-scoped episodic recall

use crate::error::{IntentRootError, Result};
use crate::index::{MetadataFilter, SearchRequest, VectorIndex, Vectors};
use crate::llm::Embedder;
use crate::types::EpisodicEntry;
use serde::Serialize;

/// A recalled entry with its similarity to the query text
#[derive(Debug, Clone, Serialize)]
pub struct RecalledEntry {
    pub entry: EpisodicEntry,
    pub score: f64,
}

/// Most similar past entries of one session, newest first on equal score
pub async fn recall(
    index: &dyn VectorIndex,
    embedder: &dyn Embedder,
    collection: &str,
    session_id: &str,
    text: &str,
    k: usize,
) -> Result<Vec<RecalledEntry>> {
    if k == 0 {
        return Ok(Vec::new());
    }

    let vector = embedder.embed(text).await?;
    let request = SearchRequest::new(Vectors::Dense(vector), k)
        .with_filter(Some(MetadataFilter::new().must_eq("session_id", session_id)))
        .with_recency_key("timestamp");

    let hits = match index.search(collection, &request).await {
        Ok(hits) => hits,
        Err(IntentRootError::CollectionNotFound(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut recalled: Vec<RecalledEntry> = hits
        .into_iter()
        .filter_map(|hit| {
            EpisodicEntry::from_payload(&hit.payload).map(|entry| RecalledEntry {
                entry,
                score: hit.score,
            })
        })
        .collect();

    recalled.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.entry.timestamp.cmp(&a.entry.timestamp))
    });
    Ok(recalled)
}
