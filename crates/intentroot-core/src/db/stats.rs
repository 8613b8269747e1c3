//! Database statistics

use super::Database;
use crate::error::Result;

/// Database stats
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseStats {
    pub collection_count: usize,
    pub point_count: usize,
    pub vector_count: usize,
    pub schema_version: Option<i32>,
}

impl Database {
    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let collection_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM collections", [], |row| row.get(0))?;

        let point_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM points", [], |row| row.get(0))?;

        let vector_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM point_vectors", [], |row| row.get(0))?;

        Ok(DatabaseStats {
            collection_count: collection_count as usize,
            point_count: point_count as usize,
            vector_count: vector_count as usize,
            schema_version: self.schema_version()?,
        })
    }
}
