//! Redis-backed job broker. The API pushes job ids; the worker pops them.
//! Job state and results live in Postgres — Redis carries ids only, so a
//! lost queue entry is visible as a job stuck in `queued`.

use redis::AsyncCommands;
use tracing::{debug, warn};
use uuid::Uuid;

pub const EVALUATION_QUEUE_KEY: &str = "screening:evaluation:queue";

/// Pushes a job id onto the evaluation queue.
pub async fn enqueue_job(client: &redis::Client, job_id: Uuid) -> Result<(), redis::RedisError> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    let depth: i64 = conn
        .lpush(EVALUATION_QUEUE_KEY, job_id.to_string())
        .await?;
    debug!("Enqueued job {job_id} (queue depth {depth})");
    Ok(())
}

/// Blocks up to `timeout_secs` for the next job id. Returns `None` on
/// timeout; a payload that is not a UUID is logged and dropped.
pub async fn pop_job(
    conn: &mut redis::aio::MultiplexedConnection,
    timeout_secs: f64,
) -> Result<Option<Uuid>, redis::RedisError> {
    let popped: Option<(String, String)> = conn.blpop(EVALUATION_QUEUE_KEY, timeout_secs).await?;
    match popped {
        Some((_, payload)) => match payload.parse::<Uuid>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                warn!("Dropping malformed queue payload: {payload}");
                Ok(None)
            }
        },
        None => Ok(None),
    }
}
