//! Vector index client.
//!
//! The index stores document chunks written by the external ingestion
//! job and answers cosine nearest-neighbor queries at chat time. Two
//! backends implement [`VectorIndex`]: the Qdrant REST client used in
//! deployments and a brute-force in-memory index for local runs and
//! tests.

pub mod memory;
pub mod qdrant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

pub use memory::InMemoryIndex;
pub use qdrant::QdrantIndex;

/// Chunk metadata stored alongside each vector.
///
/// Immutable once upserted; the schema is owned by the ingestion
/// pipeline and only consumed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    #[serde(default)]
    pub has_watermark: bool,
}

/// A chunk as written into the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// A search hit with its similarity score and payload.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub chunk_id: String,
    pub score: f32,
    pub payload: ChunkPayload,
}

/// Connection and collection health, as reported to the admin surface.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStatus {
    pub connected: bool,
    pub exists: bool,
    pub vectors_count: u64,
    pub points_count: u64,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Nearest neighbors by cosine similarity, descending, with a
    /// stable tie-break on insertion order. At most `top_k` results.
    ///
    /// An unreachable backing store is `RagError::IndexUnavailable`,
    /// never an empty result.
    async fn search(&self, query_vector: &[f32], top_k: usize)
        -> Result<Vec<ScoredPoint>, RagError>;

    /// Write chunks. Used by the ingestion/admin collaborators only,
    /// never by query-time retrieval.
    async fn upsert(&self, chunks: Vec<ChunkRecord>) -> Result<(), RagError>;

    async fn collection_status(&self) -> CollectionStatus;

    /// All payloads for one source file, in insertion order. Backs the
    /// document-view fallback when the original file cannot be read.
    async fn chunks_for_file(&self, filename: &str) -> Result<Vec<ChunkPayload>, RagError>;
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;
    if denom <= f32::EPSILON {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn cosine_is_one_for_identical_vectors() {
        let vec = vec![1.0, 2.0, 3.0, 4.0];
        assert!(approx_eq(cosine_similarity(&vec, &vec), 1.0));
    }

    #[test]
    fn cosine_is_zero_for_orthogonal_vectors() {
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
    }

    #[test]
    fn cosine_handles_degenerate_input() {
        assert!(approx_eq(cosine_similarity(&[], &[]), 0.0));
        assert!(approx_eq(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0));
        assert!(approx_eq(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0));
    }
}
