//! Query-time retrieval.
//!
//! Encodes the query, searches the vector index, and shapes the hits
//! into citation-ready passages.

use std::sync::Arc;

use serde::Serialize;

use crate::core::errors::RagError;
use crate::embedding::Encoder;
use crate::index::VectorIndex;

/// A passage retrieved for one query. Derived per request, never
/// persisted; serialized verbatim into the chat response `sources`.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedPassage {
    #[serde(skip)]
    pub chunk_id: String,
    pub filename: String,
    pub preview: String,
    pub relevance_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    pub has_watermark: bool,
}

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Fixed number of chunks per query; a tunable, not a per-request
    /// parameter, to keep the prompt bounded.
    pub top_k: usize,
    /// Preview length ceiling in characters.
    pub preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            preview_chars: 400,
        }
    }
}

pub struct Retriever {
    encoder: Arc<dyn Encoder>,
    index: Arc<dyn VectorIndex>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        encoder: Arc<dyn Encoder>,
        index: Arc<dyn VectorIndex>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            encoder,
            index,
            config,
        }
    }

    /// Top-K passages for a query, ranked by relevance descending.
    ///
    /// Zero hits is an empty Vec, not an error; downstream treats that
    /// as "no context".
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedPassage>, RagError> {
        let query_vector = self.encoder.encode(query).await?;
        let hits = self.index.search(&query_vector, self.config.top_k).await?;

        let passages: Vec<RetrievedPassage> = hits
            .into_iter()
            .map(|hit| RetrievedPassage {
                chunk_id: hit.chunk_id,
                filename: hit.payload.filename,
                preview: truncate_preview(&hit.payload.text, self.config.preview_chars),
                relevance_score: hit.score.clamp(0.0, 1.0),
                web_url: hit.payload.web_url,
                has_watermark: hit.payload.has_watermark,
            })
            .collect();

        for passage in &passages {
            tracing::debug!(
                "Retrieved: {} (score: {:.3})",
                passage.filename,
                passage.relevance_score
            );
        }
        tracing::info!("Retrieved {} passages", passages.len());
        Ok(passages)
    }
}

/// Bound `text` to `max_chars`, cutting at the last word boundary
/// within the limit where one exists.
pub(crate) fn truncate_preview(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }

    let cut: String = trimmed.chars().take(max_chars).collect();
    let boundary = match cut.rfind(char::is_whitespace) {
        // A boundary in the first few characters is not worth keeping.
        Some(pos) if pos > max_chars / 2 => pos,
        _ => cut.len(),
    };
    let mut preview = cut[..boundary].trim_end().to_string();
    preview.push('…');
    preview
}
