//! Axum route handlers for the evaluation API.

use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::pipeline::EvaluationResult;
use crate::evaluation::queue::enqueue_job;
use crate::models::job::{EvaluationJobRow, JobStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub job_title: String,
    pub cv_id: Uuid,
    pub project_report_id: Uuid,
}

/// Response for `/evaluate` and `/result/:id`, tagged on `status`.
/// Completed jobs carry the result; failed jobs carry the error message.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatusResponse {
    Queued { id: Uuid },
    Processing { id: Uuid },
    Completed { id: Uuid, result: EvaluationResult },
    Failed { id: Uuid, error: String },
}

/// POST /evaluate
///
/// Validates that both uploaded documents exist, records a queued job, and
/// hands the id to the broker. Returns immediately — the pipeline runs in
/// the worker process.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<JobStatusResponse>, AppError> {
    if request.job_title.trim().is_empty() {
        return Err(AppError::Validation("job_title cannot be empty".to_string()));
    }
    ensure_document_exists(&state, request.cv_id, "CV").await?;
    ensure_document_exists(&state, request.project_report_id, "Project Report").await?;

    let job_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO evaluation_jobs (id, cv_id, project_report_id, job_title, status)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(job_id)
    .bind(request.cv_id)
    .bind(request.project_report_id)
    .bind(&request.job_title)
    .bind(JobStatus::Queued.as_str())
    .execute(&state.db)
    .await?;

    if let Err(e) = enqueue_job(&state.redis, job_id).await {
        // The row exists but no worker will ever see it. Mark it failed
        // before surfacing the error so /result doesn't report queued forever.
        let _ = sqlx::query(
            "UPDATE evaluation_jobs SET status = $1, error_message = $2, updated_at = now() WHERE id = $3",
        )
        .bind(JobStatus::Failed.as_str())
        .bind("Failed to enqueue job")
        .bind(job_id)
        .execute(&state.db)
        .await;
        return Err(AppError::Queue(e));
    }

    info!("Job {job_id} queued for '{}'", request.job_title);
    Ok(Json(JobStatusResponse::Queued { id: job_id }))
}

/// GET /result/:id
///
/// Reports the job's lifecycle state, including the evaluation result once
/// the pipeline has completed.
pub async fn handle_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let job = sqlx::query_as::<_, EvaluationJobRow>("SELECT * FROM evaluation_jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job with ID {id} not found")))?;

    let status = JobStatus::parse(&job.status)
        .ok_or_else(|| AppError::Internal(anyhow!("Job {id} has unknown status '{}'", job.status)))?;

    let response = match status {
        JobStatus::Queued => JobStatusResponse::Queued { id },
        JobStatus::Processing => JobStatusResponse::Processing { id },
        JobStatus::Completed => {
            let raw = job.result.ok_or_else(|| {
                AppError::Internal(anyhow!("Job {id} is completed but has no result payload"))
            })?;
            let result: EvaluationResult = serde_json::from_value(raw).map_err(|e| {
                AppError::Internal(anyhow!("Job {id} result payload is invalid: {e}"))
            })?;
            JobStatusResponse::Completed { id, result }
        }
        JobStatus::Failed => JobStatusResponse::Failed {
            id,
            error: job
                .error_message
                .unwrap_or_else(|| "Unknown error".to_string()),
        },
    };

    Ok(Json(response))
}

async fn ensure_document_exists(
    state: &AppState,
    id: Uuid,
    label: &str,
) -> Result<(), AppError> {
    let exists: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM uploaded_documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    exists
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("{label} with ID {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_response_shape() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(JobStatusResponse::Queued { id }).unwrap();
        assert_eq!(json["status"], "queued");
        assert_eq!(json["id"], id.to_string());
        assert!(json.get("result").is_none());
    }

    #[test]
    fn test_completed_response_carries_result() {
        let id = Uuid::new_v4();
        let response = JobStatusResponse::Completed {
            id,
            result: EvaluationResult {
                cv_match_rate: 0.82,
                cv_feedback: "Strong in backend".to_string(),
                project_score: 4.5,
                project_feedback: "Meets requirements".to_string(),
                overall_summary: "Good candidate fit".to_string(),
            },
        };
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["result"]["cv_match_rate"], 0.82);
        assert_eq!(json["result"]["overall_summary"], "Good candidate fit");
    }

    #[test]
    fn test_failed_response_carries_error() {
        let id = Uuid::new_v4();
        let response = JobStatusResponse::Failed {
            id,
            error: "Failed to parse PDF".to_string(),
        };
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "Failed to parse PDF");
    }

    #[test]
    fn test_evaluate_request_deserializes() {
        let raw = r#"{
            "job_title": "Backend Developer",
            "cv_id": "7b0f8f64-3f2a-4f0e-9f2f-0f6d9c1c2a3b",
            "project_report_id": "1c9e9d22-5a6b-4c7d-8e9f-0a1b2c3d4e5f"
        }"#;
        let request: EvaluateRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.job_title, "Backend Developer");
    }
}
