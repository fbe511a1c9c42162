//! Qdrant REST client.
//!
//! Talks to the collection the ingestion pipeline writes
//! (`barcelona_archives`, cosine distance). Only the query-time and
//! admin operations the backend needs are implemented.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{ChunkPayload, ChunkRecord, CollectionStatus, ScoredPoint, VectorIndex};
use crate::core::errors::RagError;

pub const DEFAULT_COLLECTION: &str = "barcelona_archives";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct QdrantIndex {
    base_url: String,
    collection: String,
    client: Client,
}

impl QdrantIndex {
    pub fn new(base_url: String, collection: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            collection,
            client,
        }
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!(
            "{}/collections/{}{}",
            self.base_url, self.collection, suffix
        )
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, RagError> {
        let body = json!({
            "vector": query_vector,
            "limit": top_k,
            "with_payload": true,
            "with_vector": false,
        });

        let res = self
            .client
            .post(self.collection_url("/points/search"))
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::IndexUnavailable(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::IndexUnavailable(format!(
                "search failed with {}: {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| RagError::IndexUnavailable(e.to_string()))?;
        Ok(parse_search_response(&payload))
    }

    async fn upsert(&self, chunks: Vec<ChunkRecord>) -> Result<(), RagError> {
        let points: Vec<Value> = chunks
            .iter()
            .map(|c| {
                json!({
                    "id": c.id,
                    "vector": c.vector,
                    "payload": c.payload,
                })
            })
            .collect();

        let res = self
            .client
            .put(self.collection_url("/points?wait=true"))
            .json(&json!({ "points": points }))
            .send()
            .await
            .map_err(|e| RagError::IndexUnavailable(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::IndexUnavailable(format!(
                "upsert failed with {}: {}",
                status, text
            )));
        }
        Ok(())
    }

    async fn collection_status(&self) -> CollectionStatus {
        let res = self.client.get(self.collection_url("")).send().await;
        match res {
            Ok(resp) if resp.status().is_success() => {
                let payload: Value = resp.json().await.unwrap_or(Value::Null);
                let result = &payload["result"];
                CollectionStatus {
                    connected: true,
                    exists: true,
                    vectors_count: result["vectors_count"].as_u64().unwrap_or(0),
                    points_count: result["points_count"].as_u64().unwrap_or(0),
                }
            }
            Ok(resp) => {
                tracing::warn!("Collection status check returned {}", resp.status());
                CollectionStatus {
                    connected: true,
                    exists: false,
                    vectors_count: 0,
                    points_count: 0,
                }
            }
            Err(err) => {
                tracing::warn!("Collection status check failed: {}", err);
                CollectionStatus {
                    connected: false,
                    exists: false,
                    vectors_count: 0,
                    points_count: 0,
                }
            }
        }
    }

    async fn chunks_for_file(&self, filename: &str) -> Result<Vec<ChunkPayload>, RagError> {
        let body = json!({
            "filter": {
                "must": [
                    { "key": "filename", "match": { "value": filename } }
                ]
            },
            "with_payload": true,
            "with_vector": false,
            "limit": 256,
        });

        let res = self
            .client
            .post(self.collection_url("/points/scroll"))
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::IndexUnavailable(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::IndexUnavailable(format!(
                "scroll failed with {}: {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| RagError::IndexUnavailable(e.to_string()))?;
        Ok(parse_scroll_response(&payload))
    }
}

fn parse_search_response(payload: &Value) -> Vec<ScoredPoint> {
    let mut hits = Vec::new();
    if let Some(results) = payload["result"].as_array() {
        for point in results {
            let Some(chunk) = parse_point_payload(&point["payload"]) else {
                continue;
            };
            hits.push(ScoredPoint {
                chunk_id: point_id_string(&point["id"]),
                score: point["score"].as_f64().unwrap_or(0.0) as f32,
                payload: chunk,
            });
        }
    }
    hits
}

fn parse_scroll_response(payload: &Value) -> Vec<ChunkPayload> {
    let mut chunks = Vec::new();
    if let Some(points) = payload["result"]["points"].as_array() {
        for point in points {
            if let Some(chunk) = parse_point_payload(&point["payload"]) {
                chunks.push(chunk);
            }
        }
    }
    chunks
}

fn parse_point_payload(payload: &Value) -> Option<ChunkPayload> {
    // Tolerates payloads written by older pipeline revisions, which
    // used `full_content` instead of `text`.
    let text = payload["text"]
        .as_str()
        .or_else(|| payload["full_content"].as_str())?
        .to_string();

    Some(ChunkPayload {
        filename: payload["filename"].as_str().unwrap_or("Unknown").to_string(),
        page_number: payload["page_number"].as_u64().map(|p| p as u32),
        text,
        web_url: payload["web_url"].as_str().map(|s| s.to_string()),
        has_watermark: payload["has_watermark"].as_bool().unwrap_or(false),
    })
}

fn point_id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}
