//! Retrieval-augmented generation pipeline.

pub mod context;
pub mod pipeline;
pub mod retriever;

pub use context::ContextAssembler;
pub use pipeline::{RagPipeline, RagResponse};
pub use retriever::{RetrievalConfig, RetrievedPassage, Retriever};
