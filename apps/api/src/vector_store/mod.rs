//! Vector document store — retrieval context for the evaluation pipeline.
//!
//! Ground-truth documents (job descriptions, scoring rubrics, case-study
//! briefs) are chunked, embedded, and stored here. The store is a trait so
//! the Qdrant backend can be swapped without touching handler or pipeline
//! code; tests run against `InMemoryVectorStore`.
//!
//! Carried in `AppState` inside a `Retriever`, which pairs the store with
//! the embeddings client.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub mod embeddings;
pub mod qdrant;

use embeddings::EmbeddingsClient;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Embedding service returned no vector")]
    MissingEmbedding,
}

/// A chunk with its embedding, ready for upsert.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub id: Uuid,
    pub source: String,
    pub text: String,
    pub vector: Vec<f32>,
}

/// A chunk returned by similarity search.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// One ground-truth source and how many chunks it holds.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub source_name: String,
    pub chunk_count: u64,
}

/// The vector store trait. Implement this to swap backends without touching
/// the endpoint, handler, or pipeline code.
///
/// Callers own embedding: methods speak vectors, never raw queries.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upserts chunks by id. Re-ingesting identical content must not duplicate.
    async fn upsert(&self, records: &[EmbeddedChunk]) -> Result<usize, VectorStoreError>;

    /// Returns the `limit` most similar chunks, restricted to the given
    /// sources. An empty source list means no restriction.
    async fn search(
        &self,
        vector: &[f32],
        sources: &[&str],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError>;

    /// Lists every source present in the store with its chunk count.
    async fn source_summaries(&self) -> Result<Vec<SourceSummary>, VectorStoreError>;
}

/// Deterministic chunk id: UUID v5 of the chunk text. Identical content
/// always maps to the same point, so upserts dedup across re-ingests.
pub fn chunk_id(text: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, text.as_bytes())
}

// ────────────────────────────────────────────────────────────────────────────
// Retriever — embeddings + store, the surface the rest of the app uses
// ────────────────────────────────────────────────────────────────────────────

/// Couples the embeddings client with a vector store backend. This is what
/// handlers and the evaluation pipeline talk to.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embeddings: EmbeddingsClient,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, embeddings: EmbeddingsClient) -> Self {
        Self { store, embeddings }
    }

    /// Embeds `query`, searches the given sources, and joins the retrieved
    /// chunk texts with `\n---\n` for prompt interpolation. Returns an empty
    /// string when nothing relevant is stored.
    pub async fn retrieve_context(
        &self,
        query: &str,
        sources: &[&str],
        limit: usize,
    ) -> Result<String, VectorStoreError> {
        let vector = self.embeddings.embed_one(query).await?;
        let hits = self.store.search(&vector, sources, limit).await?;
        if hits.is_empty() {
            debug!("No relevant chunks for query '{query}' in sources {sources:?}");
        }
        Ok(hits
            .iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n"))
    }

    /// Embeds a batch of chunks and upserts them under `source`.
    /// Returns the number of chunks written.
    pub async fn ingest_chunks(
        &self,
        source: &str,
        chunks: &[String],
    ) -> Result<usize, VectorStoreError> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let vectors = self.embeddings.embed(chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(VectorStoreError::MissingEmbedding);
        }
        let records: Vec<EmbeddedChunk> = chunks
            .iter()
            .zip(vectors)
            .map(|(text, vector)| EmbeddedChunk {
                id: chunk_id(text),
                source: source.to_string(),
                text: text.clone(),
                vector,
            })
            .collect();
        self.store.upsert(&records).await
    }

    pub async fn source_summaries(&self) -> Result<Vec<SourceSummary>, VectorStoreError> {
        self.store.source_summaries().await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// InMemoryVectorStore — cosine scan over a map, used by tests
// ────────────────────────────────────────────────────────────────────────────

/// In-memory store backed by a map keyed on chunk id. Search is a full
/// cosine scan, which is plenty for tests and local experiments.
#[derive(Default)]
pub struct InMemoryVectorStore {
    points: RwLock<BTreeMap<Uuid, EmbeddedChunk>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, records: &[EmbeddedChunk]) -> Result<usize, VectorStoreError> {
        let mut points = self.points.write().expect("vector store lock poisoned");
        for record in records {
            points.insert(record.id, record.clone());
        }
        Ok(records.len())
    }

    async fn search(
        &self,
        vector: &[f32],
        sources: &[&str],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        let points = self.points.read().expect("vector store lock poisoned");
        let mut hits: Vec<RetrievedChunk> = points
            .values()
            .filter(|p| sources.is_empty() || sources.contains(&p.source.as_str()))
            .map(|p| RetrievedChunk {
                text: p.text.clone(),
                source: p.source.clone(),
                score: cosine_similarity(vector, &p.vector),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn source_summaries(&self) -> Result<Vec<SourceSummary>, VectorStoreError> {
        let points = self.points.read().expect("vector store lock poisoned");
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for point in points.values() {
            *counts.entry(point.source.clone()).or_insert(0) += 1;
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

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str, text: &str, vector: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            id: chunk_id(text),
            source: source.to_string(),
            text: text.to_string(),
            vector,
        }
    }

    #[test]
    fn test_chunk_id_is_deterministic() {
        assert_eq!(chunk_id("same text"), chunk_id("same text"));
        assert_ne!(chunk_id("same text"), chunk_id("other text"));
    }

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let v = [0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_or_mismatched() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity_and_respects_limit() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(&[
                chunk("job_description", "close match", vec![1.0, 0.0]),
                chunk("job_description", "far match", vec![0.0, 1.0]),
                chunk("job_description", "middle match", vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let hits = store
            .search(&[1.0, 0.0], &["job_description"], 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "close match");
        assert_eq!(hits[1].text, "middle match");
    }

    #[tokio::test]
    async fn test_search_filters_by_source() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(&[
                chunk("cv_rubric", "rubric chunk", vec![1.0, 0.0]),
                chunk("job_description", "jd chunk", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], &["cv_rubric"], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, "cv_rubric");
    }

    #[tokio::test]
    async fn test_upsert_same_text_does_not_duplicate() {
        let store = InMemoryVectorStore::new();
        let record = chunk("cv_rubric", "identical chunk", vec![1.0, 0.0]);
        store.upsert(&[record.clone()]).await.unwrap();
        store.upsert(&[record]).await.unwrap();

        let summaries = store.source_summaries().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].chunk_count, 1);
    }

    #[tokio::test]
    async fn test_source_summaries_counts_per_source() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(&[
                chunk("cv_rubric", "a", vec![1.0]),
                chunk("cv_rubric", "b", vec![1.0]),
                chunk("project_rubric", "c", vec![1.0]),
            ])
            .await
            .unwrap();

        let summaries = store.source_summaries().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].source_name, "cv_rubric");
        assert_eq!(summaries[0].chunk_count, 2);
        assert_eq!(summaries[1].source_name, "project_rubric");
        assert_eq!(summaries[1].chunk_count, 1);
    }
}
