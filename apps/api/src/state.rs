use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::vector_store::embeddings::EmbeddingsClient;
use crate::vector_store::qdrant::QdrantVectorStore;
use crate::vector_store::Retriever;

/// Shared application state injected into all route handlers via Axum
/// extractors. The worker binary builds the same state and runs the queue
/// loop against it.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Job broker. The API only pushes; the worker owns its own connection.
    pub redis: RedisClient,
    pub s3: S3Client,
    pub llm: LlmClient,
    /// Ground-truth retrieval. Qdrant-backed in production, swappable via
    /// the `VectorStore` trait.
    pub retriever: Retriever,
    pub config: Config,
}

impl AppState {
    pub async fn from_config(config: Config) -> Result<Self> {
        let db = create_pool(&config.database_url).await?;

        let redis = redis::Client::open(config.redis_url.clone())?;
        info!("Redis client initialized");

        let s3 = build_s3_client(&config).await;
        info!("S3 client initialized");

        let llm = LlmClient::new(config.anthropic_api_key.clone());
        info!("LLM client initialized (model: {})", crate::llm_client::MODEL);

        let retriever = build_retriever(&config);
        info!(
            "Vector store initialized (collection: {})",
            config.qdrant_collection
        );

        Ok(AppState {
            db,
            redis,
            s3,
            llm,
            retriever,
            config,
        })
    }
}

/// Constructs the Qdrant-backed retriever. The ingest binary uses this
/// directly without the rest of the state.
pub fn build_retriever(config: &Config) -> Retriever {
    let store = Arc::new(QdrantVectorStore::new(
        config.qdrant_url.clone(),
        config.qdrant_collection.clone(),
    ));
    let embeddings = EmbeddingsClient::new(
        config.embeddings_api_url.clone(),
        config.embeddings_api_key.clone(),
        config.embeddings_model.clone(),
    );
    Retriever::new(store, embeddings)
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> S3Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "screening-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    S3Client::new(&s3_config)
}
