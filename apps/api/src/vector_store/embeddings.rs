//! Embeddings client — OpenAI-compatible `/v1/embeddings` endpoint.
//!
//! The endpoint, key, and model come from config so a self-hosted
//! OpenAI-compatible server works the same as the hosted API. Vector
//! dimension is never configured: the store reads it off the first vector.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::VectorStoreError;

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingObject>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingObject {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Clone)]
pub struct EmbeddingsClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl EmbeddingsClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// Embeds a batch of texts. Output order matches input order.
    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, VectorStoreError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let request_body = EmbeddingsRequest {
            model: &self.model,
            input: inputs,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VectorStoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut parsed: EmbeddingsResponse = response.json().await?;
        // The API is expected to preserve order; sort by index anyway.
        parsed.data.sort_by_key(|d| d.index);

        debug!(
            "Embedded {} texts with model {}",
            parsed.data.len(),
            self.model
        );
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Embeds a single text.
    pub async fn embed_one(&self, input: &str) -> Result<Vec<f32>, VectorStoreError> {
        let inputs = [input.to_string()];
        self.embed(&inputs)
            .await?
            .into_iter()
            .next()
            .ok_or(VectorStoreError::MissingEmbedding)
    }
}
