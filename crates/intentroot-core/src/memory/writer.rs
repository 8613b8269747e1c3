//! Fire-and-forget episodic memory writes

use crate::error::Result;
use crate::index::{PointInsert, VectorIndex, VectorSchema, Vectors};
use crate::llm::Embedder;
use crate::types::{Decision, EpisodicEntry, Query, Role, FACET_CONTENT};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

/// Appends user/assistant turns to the episodic collection
#[derive(Clone)]
pub struct MemoryWriter {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    ensured: Arc<OnceCell<()>>,
}

impl MemoryWriter {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            index,
            collection: collection.into(),
            ensured: Arc::new(OnceCell::new()),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Spawn the write and return immediately
    ///
    /// The returned handle resolves to the number of entries written; errors
    /// are logged inside the task and never surface to the caller.
    pub fn record(
        &self,
        query: &Query,
        decision: &Decision,
        response: Option<&str>,
    ) -> JoinHandle<usize> {
        let writer = self.clone();
        let entries = build_entries(query, decision, response);

        tokio::spawn(async move {
            match writer.write_entries(entries).await {
                Ok(written) => {
                    tracing::debug!(written, collection = %writer.collection, "Episodic memory written");
                    written
                }
                Err(e) => {
                    tracing::error!(error = %e, collection = %writer.collection, "Episodic memory write failed");
                    0
                }
            }
        })
    }

    /// Embed and upsert entries in order
    pub async fn write_entries(&self, mut entries: Vec<EpisodicEntry>) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = entries.iter().map(|e| e.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        for (entry, embedding) in entries.iter_mut().zip(embeddings) {
            entry.embedding = embedding;
        }

        self.ensure_collection(entries[0].embedding.len()).await?;

        let mut written = 0;
        for entry in entries {
            self.index
                .upsert(
                    &self.collection,
                    PointInsert {
                        id: entry.point_id(),
                        payload: entry.to_payload(),
                        vectors: Vectors::Dense(entry.embedding),
                    },
                )
                .await?;
            written += 1;
        }
        Ok(written)
    }

    async fn ensure_collection(&self, dimensions: usize) -> Result<()> {
        self.ensured
            .get_or_try_init(|| async {
                let schema = VectorSchema::new(dimensions, [FACET_CONTENT]);
                self.index
                    .ensure_collection(&self.collection, &schema)
                    .await
                    .map(|_| ())
            })
            .await?;
        Ok(())
    }
}

/// One entry for the query and one for the response when present
pub fn build_entries(
    query: &Query,
    decision: &Decision,
    response: Option<&str>,
) -> Vec<EpisodicEntry> {
    let mut entries = vec![EpisodicEntry {
        role: Role::User,
        text: query.text.clone(),
        embedding: Vec::new(),
        timestamp: query.received_at,
        session_id: query.session_id.clone(),
        intent: decision.final_intent.clone(),
    }];

    if let Some(text) = response.filter(|r| !r.trim().is_empty()) {
        entries.push(EpisodicEntry {
            role: Role::Assistant,
            text: text.to_string(),
            embedding: Vec::new(),
            timestamp: Utc::now().max(decision.decided_at),
            session_id: query.session_id.clone(),
            intent: decision.final_intent.clone(),
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_entries_roles() {
        let query = Query::new("where is my order", "s1");
        let decision = Decision {
            final_intent: Some("order_management".into()),
            confidence: 0.9,
            contributing_candidates: Vec::new(),
            decided_at: Utc::now(),
        };

        let only_user = build_entries(&query, &decision, None);
        assert_eq!(only_user.len(), 1);
        assert_eq!(only_user[0].role, Role::User);

        let both = build_entries(&query, &decision, Some("It ships tomorrow."));
        assert_eq!(both.len(), 2);
        assert_eq!(both[1].role, Role::Assistant);
        assert_eq!(both[1].intent.as_deref(), Some("order_management"));
        assert!(both[1].timestamp >= both[0].timestamp);

        assert_eq!(build_entries(&query, &decision, Some("  ")).len(), 1);
    }
}
