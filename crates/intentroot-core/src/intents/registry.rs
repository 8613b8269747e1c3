//! In-process snapshot of known intents

use crate::error::{IntentRootError, Result};
use crate::index::{StoredPoint, VectorIndex};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// What the resolver knows about one intent without touching the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentSummary {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub domain: Option<String>,
}

impl IntentSummary {
    pub fn from_point(point: &StoredPoint) -> Self {
        let text = |key: &str| {
            point
                .payload
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        Self {
            id: text("intent").unwrap_or_else(|| point.id.clone()),
            title: text("title"),
            description: text("description"),
            domain: text("domain"),
        }
    }
}

/// Immutable set of intents, sorted by id
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntentSnapshot {
    intents: Vec<IntentSummary>,
    loaded_at: Option<DateTime<Utc>>,
}

impl IntentSnapshot {
    pub fn new(mut intents: Vec<IntentSummary>) -> Self {
        intents.sort_by(|a, b| a.id.cmp(&b.id));
        intents.dedup_by(|a, b| a.id == b.id);
        Self {
            intents,
            loaded_at: Some(Utc::now()),
        }
    }

    pub fn intents(&self) -> &[IntentSummary] {
        &self.intents
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.intents.iter().map(|i| i.id.as_str())
    }

    pub fn get(&self, id: &str) -> Option<&IntentSummary> {
        self.intents
            .binary_search_by(|i| i.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.intents[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }
}

/// Shared registry; readers take cheap snapshots, only `reload` writes
#[derive(Debug, Default)]
pub struct IntentRegistry {
    current: RwLock<Arc<IntentSnapshot>>,
}

/// Upper bound on records read per collection during reload
const RELOAD_LIMIT: usize = 100_000;

impl IntentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: IntentSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn snapshot(&self) -> Arc<IntentSnapshot> {
        let guard = self.current.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&guard)
    }

    /// Rebuild from the intent collections; missing collections are skipped
    pub async fn reload(&self, index: &dyn VectorIndex, collections: &[String]) -> Result<usize> {
        let mut intents = Vec::new();
        for collection in collections {
            match index.scroll(collection, None, RELOAD_LIMIT).await {
                Ok(points) => intents.extend(points.iter().map(IntentSummary::from_point)),
                Err(IntentRootError::CollectionNotFound(_)) => {
                    tracing::debug!(collection = %collection, "Intent collection not created yet");
                }
                Err(e) => return Err(e),
            }
        }

        let snapshot = Arc::new(IntentSnapshot::new(intents));
        let count = snapshot.len();
        {
            let mut guard = self.current.write().unwrap_or_else(|p| p.into_inner());
            *guard = snapshot;
        }

        tracing::info!(intents = count, "Intent registry reloaded");
        Ok(count)
    }
}
