//! Read-through document store.
//!
//! Serves the full original text behind a citation's "open source"
//! view. When the original file cannot be read, the stored chunk texts
//! for that file are served instead, flagged as partial, so the viewer
//! still shows something rather than a dead link.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::core::errors::ApiError;
use crate::index::VectorIndex;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentText {
    pub filename: String,
    pub text: String,
    /// True when the text was reassembled from index chunks instead of
    /// the original file.
    pub partial: bool,
}

#[derive(Clone)]
pub struct DocumentStore {
    root: PathBuf,
    index: Arc<dyn VectorIndex>,
}

impl DocumentStore {
    pub fn new(root: PathBuf, index: Arc<dyn VectorIndex>) -> Self {
        Self { root, index }
    }

    pub async fn fetch(&self, filename: &str) -> Result<DocumentText, ApiError> {
        validate_filename(filename)?;

        let path = self.root.join(filename);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(DocumentText {
                filename: filename.to_string(),
                text,
                partial: false,
            }),
            Err(err) => {
                tracing::warn!(
                    "Document read failed for {}, falling back to indexed chunks: {}",
                    filename,
                    err
                );
                self.fetch_from_index(filename).await
            }
        }
    }

    async fn fetch_from_index(&self, filename: &str) -> Result<DocumentText, ApiError> {
        let chunks = self
            .index
            .chunks_for_file(filename)
            .await
            .map_err(ApiError::from)?;

        if chunks.is_empty() {
            return Err(ApiError::NotFound(format!(
                "Document not found: {}",
                filename
            )));
        }

        let text = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(DocumentText {
            filename: filename.to_string(),
            text,
            partial: true,
        })
    }
}

fn validate_filename(filename: &str) -> Result<(), ApiError> {
    if filename.trim().is_empty() {
        return Err(ApiError::BadRequest("filename must not be empty".to_string()));
    }
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ApiError::BadRequest(format!(
            "invalid filename: {}",
            filename
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::index::{ChunkPayload, ChunkRecord, InMemoryIndex};

    fn chunk(id: &str, filename: &str, text: &str) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            vector: vec![1.0, 0.0],
            payload: ChunkPayload {
                filename: filename.to_string(),
                page_number: None,
                text: text.to_string(),
                web_url: None,
                has_watermark: false,
            },
        }
    }

    #[tokio::test]
    async fn serves_original_file_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("plans.txt")).unwrap();
        writeln!(file, "Full document body.").unwrap();

        let store = DocumentStore::new(dir.path().to_path_buf(), Arc::new(InMemoryIndex::new()));
        let doc = store.fetch("plans.txt").await.unwrap();
        assert!(!doc.partial);
        assert!(doc.text.contains("Full document body."));
    }

    #[tokio::test]
    async fn falls_back_to_indexed_chunks_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(InMemoryIndex::with_records(vec![
            chunk("1", "plans.txt", "First chunk."),
            chunk("2", "plans.txt", "Second chunk."),
        ]));

        let store = DocumentStore::new(dir.path().to_path_buf(), index);
        let doc = store.fetch("plans.txt").await.unwrap();
        assert!(doc.partial);
        assert_eq!(doc.text, "First chunk.\n\nSecond chunk.");
    }

    #[tokio::test]
    async fn missing_everywhere_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().to_path_buf(), Arc::new(InMemoryIndex::new()));
        let err = store.fetch("gone.txt").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().to_path_buf(), Arc::new(InMemoryIndex::new()));
        for name in ["../etc/passwd", "a/b.txt", "..", "dir\\file"] {
            let err = store.fetch(name).await.unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)), "{}", name);
        }
    }
}
