//! Database layer for intentroot
//!
//! Provides SQLite-based storage with:
//! - Collections with a declared vector layout
//! - Points with JSON payloads and named facet vectors
//! - Brute-force cosine search computed in Rust

mod collections;
mod points;
mod schema;
mod stats;
pub mod vectors;

pub use collections::CollectionInfo;
pub use schema::Database;
pub use stats::DatabaseStats;
use std::path::PathBuf;

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CACHE_DIR_NAME)
            .join("index.sqlite")
    }
}
