//! The background evaluator loop: pop a job id, claim the row, run the
//! pipeline, record the terminal status. One job at a time per process;
//! run more worker processes for throughput.

use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::evaluation::pipeline::run_evaluation;
use crate::evaluation::queue::{self, EVALUATION_QUEUE_KEY};
use crate::models::job::{EvaluationJobRow, JobStatus};
use crate::state::AppState;

const POLL_TIMEOUT_SECS: f64 = 5.0;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Runs the worker loop forever. Queue errors trigger a reconnect; job
/// failures are recorded on the job row and never stop the loop.
pub async fn run(state: AppState) -> Result<()> {
    let mut conn = state.redis.get_multiplexed_async_connection().await?;
    info!("Worker listening on queue '{EVALUATION_QUEUE_KEY}'");

    loop {
        let job_id = match queue::pop_job(&mut conn, POLL_TIMEOUT_SECS).await {
            Ok(Some(id)) => id,
            Ok(None) => continue,
            Err(e) => {
                warn!(
                    "Queue error: {e}; reconnecting in {}s",
                    RECONNECT_DELAY.as_secs()
                );
                tokio::time::sleep(RECONNECT_DELAY).await;
                match state.redis.get_multiplexed_async_connection().await {
                    Ok(fresh) => conn = fresh,
                    Err(e) => warn!("Redis reconnect failed: {e}"),
                }
                continue;
            }
        };

        process_job(&state, job_id).await;
    }
}

/// Runs one job to a terminal status.
async fn process_job(state: &AppState, job_id: Uuid) {
    // Claim: only a queued job may move to processing. A zero row count
    // means the id is unknown or another worker got there first.
    let claimed = sqlx::query(
        "UPDATE evaluation_jobs SET status = $1, updated_at = now() WHERE id = $2 AND status = $3",
    )
    .bind(JobStatus::Processing.as_str())
    .bind(job_id)
    .bind(JobStatus::Queued.as_str())
    .execute(&state.db)
    .await;

    match claimed {
        Ok(done) if done.rows_affected() == 0 => {
            warn!("Job {job_id} not claimable (missing or already claimed); skipping");
            return;
        }
        Ok(_) => info!("Job {job_id} status: processing"),
        Err(e) => {
            error!("Failed to claim job {job_id}: {e}");
            return;
        }
    }

    let job = match sqlx::query_as::<_, EvaluationJobRow>(
        "SELECT * FROM evaluation_jobs WHERE id = $1",
    )
    .bind(job_id)
    .fetch_one(&state.db)
    .await
    {
        Ok(job) => job,
        Err(e) => {
            error!("Failed to load job {job_id} after claim: {e}");
            return;
        }
    };

    match run_evaluation(state, &job).await {
        Ok(result) => {
            let payload = match serde_json::to_value(&result) {
                Ok(v) => v,
                Err(e) => {
                    record_failure(state, job_id, &format!("Failed to serialize result: {e}"))
                        .await;
                    return;
                }
            };
            let updated = sqlx::query(
                "UPDATE evaluation_jobs SET status = $1, result = $2, updated_at = now() WHERE id = $3",
            )
            .bind(JobStatus::Completed.as_str())
            .bind(payload)
            .bind(job_id)
            .execute(&state.db)
            .await;
            match updated {
                Ok(_) => info!("Job {job_id} status: completed"),
                Err(e) => error!("Failed to record result for job {job_id}: {e}"),
            }
        }
        Err(e) => {
            error!("Evaluation pipeline failed for job {job_id}: {e:#}");
            record_failure(state, job_id, &format!("{e:#}")).await;
        }
    }
}

async fn record_failure(state: &AppState, job_id: Uuid, message: &str) {
    let updated = sqlx::query(
        "UPDATE evaluation_jobs SET status = $1, error_message = $2, updated_at = now() WHERE id = $3",
    )
    .bind(JobStatus::Failed.as_str())
    .bind(message)
    .bind(job_id)
    .execute(&state.db)
    .await;

    match updated {
        Ok(_) => info!("Job {job_id} status: failed"),
        Err(e) => error!("Failed to record failure for job {job_id}: {e}"),
    }
}
