//! Qdrant REST implementation of `VectorStore`.
//!
//! Talks plain HTTP via `reqwest` — no generated client. The collection is
//! created lazily on the first upsert (cosine distance, dimension taken from
//! the first vector). Every chunk carries a `{ source, text }` payload;
//! search filters on `source`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{EmbeddedChunk, RetrievedChunk, SourceSummary, VectorStore, VectorStoreError};

const SCROLL_PAGE_SIZE: usize = 256;

#[derive(Debug, Deserialize)]
struct QdrantEnvelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    payload: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ScrollPage {
    points: Vec<PayloadPoint>,
    next_page_offset: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct PayloadPoint {
    payload: Option<Value>,
}

pub struct QdrantVectorStore {
    client: Client,
    base_url: String,
    collection: String,
}

impl QdrantVectorStore {
    pub fn new(base_url: String, collection: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            collection,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    /// Creates the collection if it does not exist yet.
    async fn ensure_collection(&self, dim: usize) -> Result<(), VectorStoreError> {
        let url = self.collection_url();
        let response = self.client.get(&url).send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        if response.status().as_u16() != 404 {
            return Err(api_error(response).await);
        }

        let body = json!({ "vectors": { "size": dim, "distance": "Cosine" } });
        let response = self.client.put(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        info!(
            "Created Qdrant collection '{}' (dim {dim}, cosine)",
            self.collection
        );
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn upsert(&self, records: &[EmbeddedChunk]) -> Result<usize, VectorStoreError> {
        let Some(first) = records.first() else {
            return Ok(0);
        };
        self.ensure_collection(first.vector.len()).await?;

        let url = format!("{}/points?wait=true", self.collection_url());
        let response = self
            .client
            .put(&url)
            .json(&upsert_body(records))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        debug!(
            "Upserted {} points into '{}'",
            records.len(),
            self.collection
        );
        Ok(records.len())
    }

    async fn search(
        &self,
        vector: &[f32],
        sources: &[&str],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        let url = format!("{}/points/search", self.collection_url());
        let response = self
            .client
            .post(&url)
            .json(&search_body(vector, sources, limit))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let envelope: QdrantEnvelope<Vec<ScoredPoint>> = response.json().await?;
        Ok(envelope
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload.unwrap_or(Value::Null);
                RetrievedChunk {
                    text: payload_str(&payload, "text"),
                    source: payload_str(&payload, "source"),
                    score: point.score,
                }
            })
            .collect())
    }

    async fn source_summaries(&self) -> Result<Vec<SourceSummary>, VectorStoreError> {
        let url = format!("{}/points/scroll", self.collection_url());
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut offset: Option<Value> = None;

        loop {
            let mut body = json!({
                "limit": SCROLL_PAGE_SIZE,
                "with_payload": true,
                "with_vector": false,
            });
            if let Some(o) = &offset {
                body["offset"] = o.clone();
            }

            let response = self.client.post(&url).json(&body).send().await?;
            // No collection yet means no documents have been ingested.
            if response.status().as_u16() == 404 {
                return Ok(Vec::new());
            }
            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            let envelope: QdrantEnvelope<ScrollPage> = response.json().await?;
            for point in &envelope.result.points {
                let payload = point.payload.clone().unwrap_or(Value::Null);
                let source = payload_str(&payload, "source");
                if !source.is_empty() {
                    *counts.entry(source).or_insert(0) += 1;
                }
            }

            match envelope.result.next_page_offset {
                Some(o) if !o.is_null() => offset = Some(o),
                _ => break,
            }
        }

        Ok(counts
            .into_iter()
            .map(|(source_name, chunk_count)| SourceSummary {
                source_name,
                chunk_count,
            })
            .collect())
    }
}

async fn api_error(response: reqwest::Response) -> VectorStoreError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    VectorStoreError::Api { status, message }
}

fn payload_str(payload: &Value, key: &str) -> String {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn upsert_body(records: &[EmbeddedChunk]) -> Value {
    let points: Vec<Value> = records
        .iter()
        .map(|r| {
            json!({
                "id": r.id.to_string(),
                "vector": r.vector,
                "payload": { "source": r.source, "text": r.text },
            })
        })
        .collect();
    json!({ "points": points })
}

fn search_body(vector: &[f32], sources: &[&str], limit: usize) -> Value {
    let mut body = json!({
        "vector": vector,
        "limit": limit,
        "with_payload": true,
    });
    if !sources.is_empty() {
        body["filter"] = json!({
            "must": [{ "key": "source", "match": { "any": sources } }]
        });
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::chunk_id;

    #[test]
    fn test_search_body_includes_source_filter() {
        let body = search_body(&[0.1, 0.2], &["cv_rubric", "job_description"], 5);
        assert_eq!(body["limit"], 5);
        assert_eq!(body["filter"]["must"][0]["key"], "source");
        assert_eq!(
            body["filter"]["must"][0]["match"]["any"],
            json!(["cv_rubric", "job_description"])
        );
    }

    #[test]
    fn test_search_body_without_sources_has_no_filter() {
        let body = search_body(&[0.1], &[], 3);
        assert!(body.get("filter").is_none());
    }

    #[test]
    fn test_upsert_body_carries_payload_and_string_ids() {
        let record = EmbeddedChunk {
            id: chunk_id("some rubric text"),
            source: "cv_rubric".to_string(),
            text: "some rubric text".to_string(),
            vector: vec![0.5, 0.5],
        };
        let body = upsert_body(std::slice::from_ref(&record));
        let point = &body["points"][0];
        assert_eq!(point["id"], record.id.to_string());
        assert_eq!(point["payload"]["source"], "cv_rubric");
        assert_eq!(point["payload"]["text"], "some rubric text");
    }

    #[test]
    fn test_scored_point_deserializes_from_qdrant_shape() {
        let raw = r#"{
            "result": [
                { "id": "x", "version": 3, "score": 0.87,
                  "payload": { "source": "cv_rubric", "text": "chunk body" } }
            ],
            "status": "ok",
            "time": 0.002
        }"#;
        let envelope: QdrantEnvelope<Vec<ScoredPoint>> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.result.len(), 1);
        assert!((envelope.result[0].score - 0.87).abs() < 1e-6);
    }
}
