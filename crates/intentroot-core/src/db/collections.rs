//! Collection operations

use super::Database;
use crate::error::{IntentRootError, Result};
use crate::index::VectorSchema;
use chrono::Utc;
use rusqlite::params;

/// Collection info
#[derive(Debug, Clone, serde::Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub dimensions: usize,
    pub facets: Vec<String>,
    pub point_count: usize,
    pub created_at: String,
}

impl Database {
    /// Add a new collection
    pub fn create_collection(&self, name: &str, schema: &VectorSchema) -> Result<()> {
        if name.trim().is_empty() {
            return Err(IntentRootError::InvalidInput(
                "Collection name must not be empty".to_string(),
            ));
        }
        if schema.dimensions == 0 || schema.facets.is_empty() {
            return Err(IntentRootError::InvalidInput(format!(
                "Collection {} needs positive dimensions and at least one facet",
                name
            )));
        }
        if self.get_collection_schema(name)?.is_some() {
            return Err(IntentRootError::CollectionExists(name.to_string()));
        }

        let now = Utc::now().to_rfc3339();
        let facets = serde_json::to_string(&schema.facets)?;
        self.conn.execute(
            "INSERT INTO collections (name, dimensions, facets, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, schema.dimensions as i64, facets, now],
        )?;
        Ok(())
    }

    /// Get the vector schema of a collection
    pub fn get_collection_schema(&self, name: &str) -> Result<Option<VectorSchema>> {
        let result = self.conn.query_row(
            "SELECT dimensions, facets FROM collections WHERE name = ?1",
            params![name],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        );

        match result {
            Ok((dimensions, facets_json)) => {
                let facets: Vec<String> = serde_json::from_str(&facets_json)?;
                Ok(Some(VectorSchema {
                    dimensions: dimensions as usize,
                    facets,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Schema of a collection that must exist
    pub fn require_collection(&self, name: &str) -> Result<VectorSchema> {
        self.get_collection_schema(name)?
            .ok_or_else(|| IntentRootError::CollectionNotFound(name.to_string()))
    }

    /// Remove a collection and all of its points
    pub fn remove_collection(&self, name: &str) -> Result<bool> {
        self.conn.execute("BEGIN IMMEDIATE", [])?;
        let result = (|| {
            self.conn.execute(
                "DELETE FROM point_vectors WHERE collection = ?1",
                params![name],
            )?;
            self.conn
                .execute("DELETE FROM points WHERE collection = ?1", params![name])?;
            let rows = self
                .conn
                .execute("DELETE FROM collections WHERE name = ?1", params![name])?;
            Ok(rows > 0)
        })();

        if result.is_ok() {
            self.conn.execute("COMMIT", [])?;
        } else {
            let _ = self.conn.execute("ROLLBACK", []);
        }
        result
    }

    /// List all collections with point counts
    pub fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.name, c.dimensions, c.facets, c.created_at,
                    (SELECT COUNT(*) FROM points p WHERE p.collection = c.name)
             FROM collections c
             ORDER BY c.name",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(name, dimensions, facets, created_at, count)| -> Result<CollectionInfo> {
                Ok(CollectionInfo {
                    name,
                    dimensions: dimensions as usize,
                    facets: serde_json::from_str(&facets)?,
                    point_count: count as usize,
                    created_at,
                })
            })
            .collect()
    }
}
