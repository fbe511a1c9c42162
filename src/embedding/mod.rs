//! Query/document embedding.
//!
//! The corpus is indexed with a 512-dimensional multilingual text
//! model; query-time encoding must use the same model, so the
//! dimension is fixed here and verified by every implementation.

pub mod remote;

use async_trait::async_trait;

use crate::core::errors::RagError;

pub use remote::RemoteEncoder;

/// Dimension of the embedding space shared with the ingestion pipeline.
pub const EMBEDDING_DIM: usize = 512;

/// Turns text into a fixed-length dense vector.
///
/// Deterministic for identical input and model version. Empty input is
/// a user error (`RagError::Encoding`) and must fail before any I/O.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

pub(crate) fn reject_empty(text: &str) -> Result<(), RagError> {
    if text.trim().is_empty() {
        return Err(RagError::Encoding(
            "cannot encode empty input".to_string(),
        ));
    }
    Ok(())
}
