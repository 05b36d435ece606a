//! The evaluation pipeline — the linear call sequence the worker runs for
//! one job: load documents → retrieve ground-truth context → score CV →
//! score project → synthesize summary.
//!
//! Each LLM response is validated against the structs below; a response
//! that fails validation fails the job. Scores are clamped to their
//! documented ranges before persisting.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::evaluation::prompts::{
    build_cv_prompt, build_project_prompt, build_summary_prompt, cv_eval_system,
    project_eval_system, summary_system,
};
use crate::extract::extract_pdf_text;
use crate::models::document::UploadedDocumentRow;
use crate::models::job::EvaluationJobRow;
use crate::state::AppState;
use crate::uploads::storage;

/// Ground-truth source names the pipeline retrieves against. These match
/// the `source_name` values used when ingesting via `POST /documents`.
pub const SOURCE_JOB_DESCRIPTION: &str = "job_description";
pub const SOURCE_CV_RUBRIC: &str = "cv_rubric";
pub const SOURCE_CASE_STUDY_BRIEF: &str = "case_study_brief";
pub const SOURCE_PROJECT_RUBRIC: &str = "project_rubric";

/// Chunks retrieved per context query.
const RAG_RESULT_LIMIT: usize = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct CvEvaluation {
    pub cv_match_rate: f64,
    pub cv_feedback: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectEvaluation {
    pub project_score: f64,
    pub project_feedback: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinalSummary {
    pub overall_summary: String,
}

/// The payload persisted on a completed job and returned by `/result/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub cv_match_rate: f64,
    pub cv_feedback: String,
    pub project_score: f64,
    pub project_feedback: String,
    pub overall_summary: String,
}

/// Runs the full pipeline for one claimed job.
pub async fn run_evaluation(state: &AppState, job: &EvaluationJobRow) -> Result<EvaluationResult> {
    info!("Starting evaluation pipeline for job {}", job.id);

    let cv_text = load_document_text(state, job.cv_id).await?;
    let report_text = load_document_text(state, job.project_report_id).await?;

    info!("Job {}: evaluating CV", job.id);
    let jd_context = state
        .retriever
        .retrieve_context(
            &format!("skills and requirements for {}", job.job_title),
            &[SOURCE_JOB_DESCRIPTION],
            RAG_RESULT_LIMIT,
        )
        .await
        .context("Job description retrieval failed")?;
    let cv_rubric_context = state
        .retriever
        .retrieve_context("cv scoring rubric", &[SOURCE_CV_RUBRIC], RAG_RESULT_LIMIT)
        .await
        .context("CV rubric retrieval failed")?;
    let cv_prompt = build_cv_prompt(&cv_text, &jd_context, &cv_rubric_context);
    let cv_eval: CvEvaluation = state
        .llm
        .call_json(&cv_prompt, &cv_eval_system())
        .await
        .context("CV evaluation call failed")?;

    info!("Job {}: evaluating project report", job.id);
    let brief_context = state
        .retriever
        .retrieve_context(
            "case study requirements",
            &[SOURCE_CASE_STUDY_BRIEF],
            RAG_RESULT_LIMIT,
        )
        .await
        .context("Case study brief retrieval failed")?;
    let project_rubric_context = state
        .retriever
        .retrieve_context(
            "project scoring rubric",
            &[SOURCE_PROJECT_RUBRIC],
            RAG_RESULT_LIMIT,
        )
        .await
        .context("Project rubric retrieval failed")?;
    let project_prompt = build_project_prompt(&report_text, &brief_context, &project_rubric_context);
    let project_eval: ProjectEvaluation = state
        .llm
        .call_json(&project_prompt, &project_eval_system())
        .await
        .context("Project evaluation call failed")?;

    info!("Job {}: synthesizing final summary", job.id);
    let summary_prompt = build_summary_prompt(
        &serde_json::to_string_pretty(&cv_eval)?,
        &serde_json::to_string_pretty(&project_eval)?,
    );
    let summary: FinalSummary = state
        .llm
        .call_json(&summary_prompt, &summary_system())
        .await
        .context("Summary call failed")?;

    info!("Evaluation pipeline succeeded for job {}", job.id);
    Ok(assemble_result(cv_eval, project_eval, summary))
}

/// Loads an uploaded document's bytes from S3 and extracts its text.
async fn load_document_text(state: &AppState, document_id: Uuid) -> Result<String> {
    let row = sqlx::query_as::<_, UploadedDocumentRow>(
        "SELECT * FROM uploaded_documents WHERE id = $1",
    )
    .bind(document_id)
    .fetch_optional(&state.db)
    .await?
    .with_context(|| format!("Uploaded document {document_id} no longer exists"))?;

    let bytes = storage::get_document(&state.s3, &state.config.s3_bucket, &row.s3_key).await?;
    let text = extract_pdf_text(&bytes)
        .with_context(|| format!("Failed to parse PDF '{}'", row.original_filename))?;

    info!(
        "Extracted {} chars from '{}' ({})",
        text.len(),
        row.original_filename,
        row.kind
    );
    Ok(text)
}

/// Clamps scores to their documented ranges and assembles the final payload.
fn assemble_result(
    cv: CvEvaluation,
    project: ProjectEvaluation,
    summary: FinalSummary,
) -> EvaluationResult {
    EvaluationResult {
        cv_match_rate: cv.cv_match_rate.clamp(0.0, 1.0),
        cv_feedback: cv.cv_feedback,
        project_score: project.project_score.clamp(1.0, 5.0),
        project_feedback: project.project_feedback,
        overall_summary: summary.overall_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cv_match_rate: f64, project_score: f64) -> EvaluationResult {
        assemble_result(
            CvEvaluation {
                cv_match_rate,
                cv_feedback: "solid backend profile".to_string(),
            },
            ProjectEvaluation {
                project_score,
                project_feedback: "meets requirements".to_string(),
            },
            FinalSummary {
                overall_summary: "recommended".to_string(),
            },
        )
    }

    #[test]
    fn test_in_range_scores_pass_through() {
        let result = sample(0.82, 4.5);
        assert!((result.cv_match_rate - 0.82).abs() < f64::EPSILON);
        assert!((result.project_score - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let result = sample(1.3, 6.0);
        assert_eq!(result.cv_match_rate, 1.0);
        assert_eq!(result.project_score, 5.0);

        let result = sample(-0.2, 0.0);
        assert_eq!(result.cv_match_rate, 0.0);
        assert_eq!(result.project_score, 1.0);
    }

    #[test]
    fn test_feedback_and_summary_are_preserved() {
        let result = sample(0.5, 3.0);
        assert_eq!(result.cv_feedback, "solid backend profile");
        assert_eq!(result.project_feedback, "meets requirements");
        assert_eq!(result.overall_summary, "recommended");
    }

    #[test]
    fn test_cv_evaluation_deserializes_from_llm_shape() {
        let raw = r#"{ "cv_match_rate": 0.74, "cv_feedback": "Good coverage of the stack." }"#;
        let eval: CvEvaluation = serde_json::from_str(raw).unwrap();
        assert!((eval.cv_match_rate - 0.74).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cv_evaluation_rejects_missing_fields() {
        let raw = r#"{ "cv_match_rate": 0.74 }"#;
        assert!(serde_json::from_str::<CvEvaluation>(raw).is_err());
    }
}
