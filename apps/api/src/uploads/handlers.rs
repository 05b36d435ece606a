//! Axum route handlers for candidate file uploads.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::has_pdf_magic;
use crate::models::document::DocumentKind;
use crate::state::AppState;
use crate::uploads::storage;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub cv_id: Uuid,
    pub project_report_id: Uuid,
}

/// One file pulled out of the multipart body.
struct UploadedFile {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// POST /upload
///
/// Accepts a multipart form with two PDF file fields, `cv` and
/// `project_report`. Stores both in S3, records them in Postgres, and
/// returns the opaque ids later passed to `/evaluate`.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut cv: Option<UploadedFile> = None;
    let mut project_report: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != "cv" && name != "project_report" {
            continue; // ignore unknown fields
        }

        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?
            .to_vec();

        let file = UploadedFile {
            filename,
            content_type,
            bytes,
        };
        if name == "cv" {
            cv = Some(file);
        } else {
            project_report = Some(file);
        }
    }

    let cv = cv.ok_or_else(|| AppError::Validation("Missing 'cv' file field".to_string()))?;
    let project_report = project_report
        .ok_or_else(|| AppError::Validation("Missing 'project_report' file field".to_string()))?;

    for file in [&cv, &project_report] {
        if !is_pdf(&file.content_type, &file.bytes) {
            return Err(AppError::Validation(
                "Invalid file type. Only PDF is allowed.".to_string(),
            ));
        }
    }

    let cv_id = store_upload(&state, DocumentKind::Cv, cv).await?;
    let project_report_id = store_upload(&state, DocumentKind::ProjectReport, project_report).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Files uploaded successfully".to_string(),
            cv_id,
            project_report_id,
        }),
    ))
}

/// Writes one upload to S3 and records it in `uploaded_documents`.
async fn store_upload(
    state: &AppState,
    kind: DocumentKind,
    file: UploadedFile,
) -> Result<Uuid, AppError> {
    let id = Uuid::new_v4();
    let s3_key = format!("uploads/{id}_{}.pdf", kind.as_str());
    let size_bytes = file.bytes.len() as i64;

    storage::put_document(
        &state.s3,
        &state.config.s3_bucket,
        &s3_key,
        file.bytes,
        "application/pdf",
    )
    .await?;

    sqlx::query(
        r#"
        INSERT INTO uploaded_documents
            (id, kind, original_filename, s3_key, content_type, size_bytes)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(kind.as_str())
    .bind(&file.filename)
    .bind(&s3_key)
    .bind(&file.content_type)
    .bind(size_bytes)
    .execute(&state.db)
    .await?;

    info!(
        "Stored {} upload {id} ('{}', {size_bytes} bytes)",
        kind.as_str(),
        file.filename
    );
    Ok(id)
}

/// A file counts as a PDF when either the declared content type or the
/// leading bytes say so. Browsers sometimes send PDFs as octet-stream.
fn is_pdf(content_type: &str, bytes: &[u8]) -> bool {
    content_type == "application/pdf" || has_pdf_magic(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf_accepts_declared_content_type() {
        assert!(is_pdf("application/pdf", b"not really checked"));
    }

    #[test]
    fn test_is_pdf_accepts_magic_bytes_with_generic_content_type() {
        assert!(is_pdf("application/octet-stream", b"%PDF-1.4 rest"));
    }

    #[test]
    fn test_is_pdf_rejects_non_pdf() {
        assert!(!is_pdf("text/plain", b"just some text"));
    }
}
