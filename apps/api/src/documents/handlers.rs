//! Axum route handlers for ground-truth document management.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::documents::ingest::ingest_source;
use crate::errors::AppError;
use crate::state::AppState;
use crate::vector_store::SourceSummary;

#[derive(Debug, Serialize)]
pub struct IngestDocumentResponse {
    pub message: String,
    pub source_name: String,
    pub chunks_added: usize,
}

/// GET /documents
///
/// Lists every ground-truth source currently in the vector store with its
/// chunk count.
pub async fn handle_list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<SourceSummary>>, AppError> {
    let summaries = state
        .retriever
        .source_summaries()
        .await
        .map_err(|e| AppError::VectorStore(e.to_string()))?;
    Ok(Json(summaries))
}

/// POST /documents
///
/// Uploads a new ground-truth document (job description, rubric, brief).
/// Multipart form: a `file` field (`.pdf` or `.txt`) and a `source_name`
/// text field. The file is chunked and embedded automatically.
pub async fn handle_ingest_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<IngestDocumentResponse>), AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut source_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .ok_or_else(|| {
                        AppError::Validation("The 'file' field has no filename".to_string())
                    })?
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?
                    .to_vec();
                file = Some((filename, bytes));
            }
            "source_name" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read source_name: {e}")))?;
                source_name = Some(value);
            }
            _ => continue,
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    let source_name = source_name
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing 'source_name' field".to_string()))?;

    let chunks_added = ingest_source(&state.retriever, &source_name, &bytes, &filename).await?;

    Ok((
        StatusCode::CREATED,
        Json(IngestDocumentResponse {
            message: "Document ingested successfully".to_string(),
            source_name,
            chunks_added,
        }),
    ))
}
