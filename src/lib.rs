//! AI-powered chat backend for a historical document archive.
//!
//! Answers natural-language questions by retrieving semantically
//! relevant passages from a vector index and grounding a configurable
//! LLM provider in them, returning the answer with ranked source
//! citations.

pub mod config;
pub mod core;
pub mod documents;
pub mod embedding;
pub mod index;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod server;
pub mod state;
