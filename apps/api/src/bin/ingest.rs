//! Seeds the vector store with ground-truth documents from a directory.
//! Each `.pdf` / `.txt` file becomes one source named after its file stem,
//! so `docs_ground_truth/cv_rubric.txt` lands as source `cv_rubric`.
//!
//! Usage: ingest [DIRECTORY]   (default: docs_ground_truth)

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use screening_api::config::Config;
use screening_api::documents::ingest::{chunk_text, MAX_CHUNK_CHARS};
use screening_api::extract::extract_text;
use screening_api::state::build_retriever;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("screening_api={}", &config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "docs_ground_truth".to_string());
    let retriever = build_retriever(&config);

    info!("Ingesting ground-truth documents from '{dir}'");
    let mut total = 0usize;

    let entries =
        std::fs::read_dir(&dir).with_context(|| format!("Cannot read directory '{dir}'"))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(source_name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let bytes =
            std::fs::read(&path).with_context(|| format!("Cannot read file '{filename}'"))?;
        let content = match extract_text(&bytes, filename) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping '{filename}': {e}");
                continue;
            }
        };

        let chunks = chunk_text(&content, MAX_CHUNK_CHARS);
        let added = retriever
            .ingest_chunks(source_name, &chunks)
            .await
            .with_context(|| format!("Ingest of source '{source_name}' failed"))?;

        info!("Ingested '{source_name}': {added} chunks");
        total += added;
    }

    info!("Done. {total} chunks ingested.");
    Ok(())
}
