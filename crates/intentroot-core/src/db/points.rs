//! Point storage and similarity search

use super::vectors::{bytes_to_embedding, cosine_similarity, embedding_to_bytes};
use super::Database;
use crate::error::{IntentRootError, Result};
use crate::index::{
    MetadataFilter, PointInsert, ScoredPoint, SearchRequest, StoredPoint, VectorSchema, Vectors,
};
use crate::types::Payload;
use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::params;
use std::cmp::Ordering;
use std::collections::BTreeMap;

impl Database {
    /// Insert or replace a point and all of its facet vectors
    pub fn upsert_point(&self, collection: &str, point: &PointInsert) -> Result<()> {
        let schema = self.require_collection(collection)?;
        let facets = resolve_upsert_facets(collection, &schema, &point.vectors)?;
        let payload = serde_json::to_string(&point.payload)?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute("BEGIN IMMEDIATE", [])?;
        let result = (|| {
            self.conn.execute(
                "INSERT INTO points (collection, id, payload, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(collection, id) DO UPDATE SET
                    payload = excluded.payload,
                    updated_at = excluded.updated_at",
                params![collection, point.id, payload, now],
            )?;
            // Re-embedding replaces the whole facet set
            self.conn.execute(
                "DELETE FROM point_vectors WHERE collection = ?1 AND id = ?2",
                params![collection, point.id],
            )?;
            for (facet, vector) in &facets {
                self.conn.execute(
                    "INSERT INTO point_vectors (collection, id, facet, embedding)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![collection, point.id, facet, embedding_to_bytes(vector)],
                )?;
            }
            Ok(())
        })();

        if result.is_ok() {
            self.conn.execute("COMMIT", [])?;
        } else {
            let _ = self.conn.execute("ROLLBACK", []);
        }
        result
    }

    /// Brute-force top-k search over one collection
    pub fn search_points(&self, collection: &str, request: &SearchRequest) -> Result<Vec<ScoredPoint>> {
        let schema = self.require_collection(collection)?;
        check_query_vectors(collection, &schema, &request.vectors)?;

        if request.top_k == 0 {
            return Ok(Vec::new());
        }

        let mut facet_scores: BTreeMap<String, BTreeMap<String, f32>> = BTreeMap::new();
        {
            let mut stmt = self
                .conn
                .prepare("SELECT id, facet, embedding FROM point_vectors WHERE collection = ?1")?;
            let rows = stmt.query_map(params![collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })?;

            for row in rows {
                let (id, facet, bytes) = row?;
                let stored = bytes_to_embedding(&bytes);
                let query = match &request.vectors {
                    Vectors::Dense(v) => Some(v),
                    Vectors::Named(named) => named.get(&facet),
                };
                if let Some(query) = query {
                    facet_scores
                        .entry(id)
                        .or_default()
                        .insert(facet, cosine_similarity(query, &stored));
                }
            }
        }

        let payloads = self.load_payloads(collection)?;

        let mut results: Vec<ScoredPoint> = facet_scores
            .into_iter()
            .filter_map(|(id, scores)| {
                let payload = payloads.get(&id)?.clone();
                if let Some(ref filter) = request.filter {
                    if !filter.matches(&payload) {
                        return None;
                    }
                }
                let score = match request.scorer {
                    Some(ref scorer) => scorer.combine(&scores),
                    None => scores.values().copied().fold(f32::MIN, f32::max) as f64,
                };
                Some(ScoredPoint {
                    id,
                    score,
                    facet_scores: scores,
                    payload,
                })
            })
            .collect();

        // Descending score; ties go newest-first when asked, then by id
        let recency_key = request.recency_key.as_deref();
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| match recency_key {
                    Some(key) => payload_time(&b.payload, key).cmp(&payload_time(&a.payload, key)),
                    None => Ordering::Equal,
                })
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(request.top_k);
        Ok(results)
    }

    /// Points matching an optional filter, ordered by id
    pub fn scroll_points(
        &self,
        collection: &str,
        filter: Option<&MetadataFilter>,
        limit: usize,
    ) -> Result<Vec<StoredPoint>> {
        self.require_collection(collection)?;

        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.payload, p.created_at, p.updated_at,
                    (SELECT GROUP_CONCAT(v.facet) FROM point_vectors v
                     WHERE v.collection = p.collection AND v.id = p.id)
             FROM points p
             WHERE p.collection = ?1
             ORDER BY p.id",
        )?;

        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut points = Vec::new();
        for (id, payload_json, created_at, updated_at, facets) in rows {
            if points.len() >= limit {
                break;
            }
            let payload: Payload = serde_json::from_str(&payload_json)?;
            if filter.map(|f| f.matches(&payload)).unwrap_or(true) {
                let mut facets: Vec<String> = facets
                    .map(|s| s.split(',').map(str::to_string).collect())
                    .unwrap_or_default();
                facets.sort();
                points.push(StoredPoint {
                    id,
                    facets,
                    payload,
                    created_at,
                    updated_at,
                });
            }
        }

        Ok(points)
    }

    fn load_payloads(&self, collection: &str) -> Result<BTreeMap<String, Payload>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, payload FROM points WHERE collection = ?1")?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut payloads = BTreeMap::new();
        for (id, json) in rows {
            payloads.insert(id, serde_json::from_str(&json)?);
        }
        Ok(payloads)
    }
}

/// Timestamp stored under `key`; unparsable or missing values sort oldest
fn payload_time(payload: &Payload, key: &str) -> Option<DateTime<FixedOffset>> {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}

fn resolve_upsert_facets<'a>(
    collection: &str,
    schema: &VectorSchema,
    vectors: &'a Vectors,
) -> Result<Vec<(String, &'a Vec<f32>)>> {
    let facets: Vec<(String, &Vec<f32>)> = match vectors {
        Vectors::Dense(v) => {
            if schema.facets.len() != 1 {
                return Err(IntentRootError::InvalidInput(format!(
                    "Collection {} has {} facets; a dense vector needs exactly one",
                    collection,
                    schema.facets.len()
                )));
            }
            vec![(schema.facets[0].clone(), v)]
        }
        Vectors::Named(named) => {
            if named.is_empty() {
                return Err(IntentRootError::InvalidInput(
                    "A point needs at least one vector".to_string(),
                ));
            }
            named.iter().map(|(k, v)| (k.clone(), v)).collect()
        }
    };

    for (facet, vector) in &facets {
        if !schema.has_facet(facet) {
            return Err(IntentRootError::UnknownFacet {
                collection: collection.to_string(),
                facet: facet.clone(),
            });
        }
        if vector.len() != schema.dimensions {
            return Err(IntentRootError::InvalidVectorSize {
                expected: schema.dimensions,
                actual: vector.len(),
            });
        }
    }
    Ok(facets)
}

fn check_query_vectors(collection: &str, schema: &VectorSchema, vectors: &Vectors) -> Result<()> {
    let all: Vec<(&str, &Vec<f32>)> = match vectors {
        Vectors::Dense(v) => vec![("", v)],
        Vectors::Named(named) => named.iter().map(|(k, v)| (k.as_str(), v)).collect(),
    };
    for (facet, vector) in all {
        if !facet.is_empty() && !schema.has_facet(facet) {
            return Err(IntentRootError::UnknownFacet {
                collection: collection.to_string(),
                facet: facet.to_string(),
            });
        }
        if vector.len() != schema.dimensions {
            return Err(IntentRootError::InvalidVectorSize {
                expected: schema.dimensions,
                actual: vector.len(),
            });
        }
    }
    Ok(())
}
