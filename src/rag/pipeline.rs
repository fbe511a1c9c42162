//! The RAG orchestrator.
//!
//! Ties retrieval, context assembly, and generation together and
//! packages the answer with its citations. Retrieval failure degrades
//! to a context-free answer; credential and provider failures
//! propagate so the API boundary can shape them.

use std::sync::Arc;

use serde::Serialize;

use super::context::ContextAssembler;
use super::retriever::{RetrievedPassage, Retriever};
use crate::core::errors::RagError;
use crate::llm::LlmBackend;

/// Fixed instruction set for grounded answering. The model must stay
/// inside the provided context, cite by ordinal, and say so when the
/// context does not cover the question.
const SYSTEM_PROMPT: &str = "You are an assistant for a historical document archive. \
Answer the user's question using only the numbered context passages provided. \
Cite passages by their number in square brackets, e.g. [1]. \
If the context does not contain the information needed, say so explicitly \
instead of guessing. When no context is provided, answer as a general \
archive assistant and note that no matching documents were found.";

/// The packaged answer. Invariants:
/// `num_sources == sources.len()` and
/// `context_used == !sources.is_empty()`.
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    pub answer: String,
    pub sources: Vec<RetrievedPassage>,
    pub context_used: bool,
    pub num_sources: usize,
}

pub struct RagPipeline {
    retriever: Retriever,
    assembler: ContextAssembler,
    llm: Arc<dyn LlmBackend>,
}

impl RagPipeline {
    pub fn new(retriever: Retriever, assembler: ContextAssembler, llm: Arc<dyn LlmBackend>) -> Self {
        Self {
            retriever,
            assembler,
            llm,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<RagResponse, RagError> {
        let passages = match self.retriever.retrieve(query).await {
            Ok(passages) => passages,
            Err(err) => {
                // Retrieval being down must not take chat down with it:
                // answer without context and flag it in the response.
                tracing::warn!("Retrieval failed, answering without context: {}", err);
                Vec::new()
            }
        };

        let context = if passages.is_empty() {
            String::new()
        } else {
            self.assembler.build_context(&passages)
        };

        let answer = self.llm.generate(SYSTEM_PROMPT, query, &context).await?;

        let num_sources = passages.len();
        Ok(RagResponse {
            answer,
            context_used: num_sources > 0,
            num_sources,
            sources: passages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::embedding::Encoder;
    use crate::index::{
        ChunkPayload, ChunkRecord, CollectionStatus, InMemoryIndex, ScoredPoint, VectorIndex,
    };
    use crate::rag::retriever::RetrievalConfig;

    struct FixedEncoder(Vec<f32>);

    #[async_trait]
    impl Encoder for FixedEncoder {
        async fn encode(&self, text: &str) -> Result<Vec<f32>, RagError> {
            if text.trim().is_empty() {
                return Err(RagError::Encoding("cannot encode empty input".to_string()));
            }
            Ok(self.0.clone())
        }
    }

    /// Index whose search always fails, as if Qdrant were down.
    struct UnreachableIndex;

    #[async_trait]
    impl VectorIndex for UnreachableIndex {
        async fn search(&self, _: &[f32], _: usize) -> Result<Vec<ScoredPoint>, RagError> {
            Err(RagError::IndexUnavailable("connection refused".to_string()))
        }

        async fn upsert(&self, _: Vec<ChunkRecord>) -> Result<(), RagError> {
            Err(RagError::IndexUnavailable("connection refused".to_string()))
        }

        async fn collection_status(&self) -> CollectionStatus {
            CollectionStatus {
                connected: false,
                exists: false,
                vectors_count: 0,
                points_count: 0,
            }
        }

        async fn chunks_for_file(&self, _: &str) -> Result<Vec<ChunkPayload>, RagError> {
            Err(RagError::IndexUnavailable("connection refused".to_string()))
        }
    }

    /// Backend that records what it was asked and returns a canned
    /// answer, or the configured error.
    struct RecordingBackend {
        calls: AtomicUsize,
        last_context: Mutex<String>,
        error: Option<fn() -> RagError>,
    }

    impl RecordingBackend {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_context: Mutex::new(String::new()),
                error: None,
            }
        }

        fn failing(error: fn() -> RagError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_context: Mutex::new(String::new()),
                error: Some(error),
            }
        }
    }

    #[async_trait]
    impl LlmBackend for RecordingBackend {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_message: &str,
            context_block: &str,
        ) -> Result<String, RagError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_context.lock().unwrap() = context_block.to_string();
            if let Some(make_err) = self.error {
                return Err(make_err());
            }
            Ok("The archive holds original architectural drawings [1].".to_string())
        }
    }

    fn record(id: &str, vector: Vec<f32>, filename: &str, text: &str) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            vector,
            payload: ChunkPayload {
                filename: filename.to_string(),
                page_number: None,
                text: text.to_string(),
                web_url: None,
                has_watermark: false,
            },
        }
    }

    fn pipeline_with(
        index: Arc<dyn VectorIndex>,
        backend: Arc<RecordingBackend>,
    ) -> RagPipeline {
        let retriever = Retriever::new(
            Arc::new(FixedEncoder(vec![1.0, 0.0])),
            index,
            RetrievalConfig::default(),
        );
        RagPipeline::new(retriever, ContextAssembler::default(), backend)
    }

    #[tokio::test]
    async fn response_invariants_hold_with_context() {
        let index = Arc::new(InMemoryIndex::with_records(vec![
            record("a", vec![0.91, 0.4], "Architectural Plans", "Gothic Quarter drawings."),
            record("t", vec![0.42, 0.9], "Trade Union Records", "Union meeting minutes."),
        ]));
        let backend = Arc::new(RecordingBackend::ok());
        let pipeline = pipeline_with(index, backend.clone());

        let response = pipeline
            .answer("What architectural plans are available?")
            .await
            .unwrap();

        assert_eq!(response.num_sources, response.sources.len());
        assert!(response.context_used);
        assert_eq!(response.sources[0].filename, "Architectural Plans");
        assert!(
            response.sources[0].relevance_score >= response.sources[1].relevance_score
        );

        // The generated context carries ordinals matching `sources`.
        let context = backend.last_context.lock().unwrap().clone();
        assert!(context.contains("[1] Source: Architectural Plans"));
        assert!(context.contains("[2] Source: Trade Union Records"));
    }

    #[tokio::test]
    async fn empty_corpus_still_produces_an_answer() {
        let index = Arc::new(InMemoryIndex::new());
        let backend = Arc::new(RecordingBackend::ok());
        let pipeline = pipeline_with(index, backend.clone());

        let response = pipeline.answer("anything in the archive?").await.unwrap();
        assert!(!response.answer.is_empty());
        assert!(!response.context_used);
        assert_eq!(response.num_sources, 0);
        assert!(backend.last_context.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_index_degrades_to_context_free_answer() {
        let backend = Arc::new(RecordingBackend::ok());
        let pipeline = pipeline_with(Arc::new(UnreachableIndex), backend.clone());

        let response = pipeline.answer("still there?").await.unwrap();
        assert!(!response.context_used);
        assert_eq!(response.num_sources, 0);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_credential_propagates_as_structured_error() {
        let index = Arc::new(InMemoryIndex::new());
        let backend = Arc::new(RecordingBackend::failing(|| {
            RagError::MissingCredential("OPENAI_API_KEY")
        }));
        let pipeline = pipeline_with(index, backend);

        let err = pipeline.answer("hello").await.unwrap_err();
        assert!(matches!(err, RagError::MissingCredential(_)));
        assert!(err.to_string().contains("API_KEY"));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let index = Arc::new(InMemoryIndex::new());
        let backend = Arc::new(RecordingBackend::failing(|| {
            RagError::ProviderRequest("upstream 503".to_string())
        }));
        let pipeline = pipeline_with(index, backend);

        let err = pipeline.answer("hello").await.unwrap_err();
        assert!(matches!(err, RagError::ProviderRequest(_)));
    }
}
