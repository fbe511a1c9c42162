use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ModelConfigService;
use crate::documents::DocumentStore;
use crate::embedding::RemoteEncoder;
use crate::index::{qdrant::DEFAULT_COLLECTION, InMemoryIndex, QdrantIndex, VectorIndex};
use crate::llm::LlmService;
use crate::rag::{ContextAssembler, RagPipeline, RetrievalConfig, Retriever};

/// Shared application state: the configuration service, the vector
/// index handle, the assembled RAG pipeline, and the document store.
#[derive(Clone)]
pub struct AppState {
    pub config: ModelConfigService,
    pub index: Arc<dyn VectorIndex>,
    pub pipeline: Arc<RagPipeline>,
    pub documents: DocumentStore,
}

impl AppState {
    /// Wire everything from the environment.
    ///
    /// - `QDRANT_HOST` / `QDRANT_PORT` / `QDRANT_COLLECTION` for the index
    ///   (`INDEX_BACKEND=memory` selects the in-memory backend instead)
    /// - `EMBEDDING_URL` / `EMBEDDING_MODEL` for the encoder sidecar
    /// - `DOCUMENTS_DIR` for the original document files
    /// - `CONFIG_DIR` for the persisted model configuration
    pub fn initialize() -> Arc<Self> {
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./config"));
        let config = ModelConfigService::from_env(Some(config_dir));

        let index = build_index();

        let encoder = Arc::new(RemoteEncoder::new(
            env::var("EMBEDDING_URL").unwrap_or_else(|_| "http://127.0.0.1:8090".to_string()),
            env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "clip-ViT-B-32-multilingual-v1".to_string()),
        ));

        let retriever = Retriever::new(encoder, index.clone(), RetrievalConfig::default());
        let llm = Arc::new(LlmService::new(config.clone()));
        let pipeline = Arc::new(RagPipeline::new(
            retriever,
            ContextAssembler::default(),
            llm,
        ));

        let documents_dir = env::var("DOCUMENTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./documents"));
        let documents = DocumentStore::new(documents_dir, index.clone());

        Arc::new(AppState {
            config,
            index,
            pipeline,
            documents,
        })
    }
}

fn build_index() -> Arc<dyn VectorIndex> {
    if env::var("INDEX_BACKEND").as_deref() == Ok("memory") {
        tracing::warn!("Using in-memory vector index; data will not persist");
        return Arc::new(InMemoryIndex::new());
    }

    let host = env::var("QDRANT_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = env::var("QDRANT_PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(6333);
    let collection =
        env::var("QDRANT_COLLECTION").unwrap_or_else(|_| DEFAULT_COLLECTION.to_string());

    tracing::info!("Connecting to Qdrant at {}:{}", host, port);
    Arc::new(QdrantIndex::new(
        format!("http://{}:{}", host, port),
        collection,
    ))
}
