//! Brute-force in-memory index.
//!
//! Selectable via `INDEX_BACKEND=memory` for local runs without a
//! Qdrant instance, and the backend unit tests exercise retrieval
//! against.

use std::sync::RwLock;

use async_trait::async_trait;

use super::{
    cosine_similarity, ChunkPayload, ChunkRecord, CollectionStatus, ScoredPoint, VectorIndex,
};
use crate::core::errors::RagError;

#[derive(Default)]
pub struct InMemoryIndex {
    records: RwLock<Vec<ChunkRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ChunkRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, RagError> {
        let records = self
            .records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut hits: Vec<ScoredPoint> = records
            .iter()
            .map(|record| ScoredPoint {
                chunk_id: record.id.clone(),
                score: cosine_similarity(query_vector, &record.vector),
                payload: record.payload.clone(),
            })
            .collect();

        // Stable sort keeps insertion order for equal scores.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn upsert(&self, chunks: Vec<ChunkRecord>) -> Result<(), RagError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for chunk in chunks {
            match records.iter_mut().find(|r| r.id == chunk.id) {
                Some(existing) => *existing = chunk,
                None => records.push(chunk),
            }
        }
        Ok(())
    }

    async fn collection_status(&self) -> CollectionStatus {
        let count = self
            .records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len() as u64;
        CollectionStatus {
            connected: true,
            exists: true,
            vectors_count: count,
            points_count: count,
        }
    }

    async fn chunks_for_file(&self, filename: &str) -> Result<Vec<ChunkPayload>, RagError> {
        let records = self
            .records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(records
            .iter()
            .filter(|r| r.payload.filename == filename)
            .map(|r| r.payload.clone())
            .collect())
    }
}
