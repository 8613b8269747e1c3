//! Local vector index on top of the SQLite database

use super::{
    MetadataFilter, PointInsert, ScoredPoint, SearchRequest, StoredPoint, VectorIndex,
    VectorSchema,
};
use crate::db::Database;
use crate::error::{IntentRootError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// [`VectorIndex`] backed by a SQLite file
///
/// The connection is not `Sync`, so every call runs on the blocking pool
/// behind a mutex.
#[derive(Clone)]
pub struct SqliteVectorIndex {
    db: Arc<Mutex<Database>>,
}

impl SqliteVectorIndex {
    /// Open (or create) an index file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::open(path)?;
        db.initialize()?;
        Ok(Self::from_database(db))
    }

    pub fn in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        db.initialize()?;
        Ok(Self::from_database(db))
    }

    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Run a closure against the database on the blocking pool
    pub async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|_| IntentRootError::Index("database lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| IntentRootError::Index(format!("index task failed: {}", e)))?
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn create_collection(&self, name: &str, schema: &VectorSchema) -> Result<()> {
        let name = name.to_string();
        let schema = schema.clone();
        self.with_db(move |db| db.create_collection(&name, &schema))
            .await
    }

    async fn collection_schema(&self, name: &str) -> Result<Option<VectorSchema>> {
        let name = name.to_string();
        self.with_db(move |db| db.get_collection_schema(&name)).await
    }

    async fn upsert(&self, collection: &str, point: PointInsert) -> Result<()> {
        let collection = collection.to_string();
        self.with_db(move |db| db.upsert_point(&collection, &point))
            .await
    }

    async fn search(&self, collection: &str, request: &SearchRequest) -> Result<Vec<ScoredPoint>> {
        let collection = collection.to_string();
        let request = request.clone();
        self.with_db(move |db| db.search_points(&collection, &request))
            .await
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&MetadataFilter>,
        limit: usize,
    ) -> Result<Vec<StoredPoint>> {
        let collection = collection.to_string();
        let filter = filter.cloned();
        self.with_db(move |db| db.scroll_points(&collection, filter.as_ref(), limit))
            .await
    }
}
