//! Durable FIFO of task-ids between the scheduler loop and the worker
//! pool, with per-task deduplication and bounded infrastructure-level
//! retry, per spec.md §4.4.
//!
//! Grounded in `fourthplaces-mntogether`'s `kernel/jobs/queue.rs`
//! (`PostgresJobQueue`, `EnqueueResult`) and the backoff formula in
//! `kernel/jobs/queue.rs::mark_failed`. This queue is distinct from the
//! task's own application-level `retry_count` (see `gateway.rs`): it
//! only governs transient failures to *dequeue and dispatch* a job, not
//! failures of the call itself.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{DialerError, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "dispatch_job_status", rename_all = "snake_case")]
pub enum DispatchJobStatus {
    Pending,
    InProgress,
    Done,
    DeadLetter,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DispatchJob {
    pub id: Uuid,
    pub task_id: Uuid,
    pub status: DispatchJobStatus,
    pub attempt: i32,
    pub max_attempts: i32,
    pub next_attempt_at: DateTime<Utc>,
}

/// Result of an enqueue attempt, distinguishing a fresh job from a hit
/// against an already-live job for the same task-id.
#[derive(Debug, Clone, Copy)]
pub enum EnqueueResult {
    Created(Uuid),
    Duplicate(Uuid),
}

impl EnqueueResult {
    pub fn job_id(&self) -> Uuid {
        match self {
            EnqueueResult::Created(id) | EnqueueResult::Duplicate(id) => *id,
        }
    }
}

#[async_trait::async_trait]
pub trait DispatchQueue: Send + Sync {
    /// Enqueues every task-id in one round-trip, per spec.md §4.4's
    /// "bulk enqueue" requirement. A task-id whose job is still live
    /// (pending or in-progress) is a no-op, reported as `Duplicate`.
    async fn enqueue_many(&self, task_ids: &[TaskId]) -> Result<Vec<EnqueueResult>, DialerError>;

    /// Claims up to `limit` due jobs for processing.
    async fn claim(&self, limit: i64) -> Result<Vec<DispatchJob>, DialerError>;

    async fn mark_done(&self, job_id: Uuid) -> Result<(), DialerError>;

    /// Marks a job as failed for an infrastructure-level reason. Retries
    /// with exponential backoff up to `max_attempts`, then dead-letters.
    async fn mark_failed(&self, job_id: Uuid, error: &str) -> Result<(), DialerError>;
}

pub struct PostgresDispatchQueue {
    pool: PgPool,
    max_attempts: i32,
    base_delay: std::time::Duration,
}

impl PostgresDispatchQueue {
    pub fn new(pool: PgPool, max_attempts: i32, base_delay: std::time::Duration) -> Self {
        Self {
            pool,
            max_attempts,
            base_delay,
        }
    }
}

#[async_trait::async_trait]
impl DispatchQueue for PostgresDispatchQueue {
    async fn enqueue_many(&self, task_ids: &[TaskId]) -> Result<Vec<EnqueueResult>, DialerError> {
        let mut results = Vec::with_capacity(task_ids.len());
        let mut tx = self.pool.begin().await?;

        for task_id in task_ids {
            let task_uuid = task_id.into_uuid();
            let inserted: Option<Uuid> = sqlx::query_scalar(
                r#"
                INSERT INTO dispatch_jobs (id, task_id, status, attempt, max_attempts, next_attempt_at)
                VALUES (gen_random_uuid(), $1, 'pending', 0, $2, NOW())
                ON CONFLICT (task_id) WHERE status IN ('pending', 'in_progress')
                DO NOTHING
                RETURNING id
                "#,
            )
            .bind(task_uuid)
            .bind(self.max_attempts)
            .fetch_optional(&mut *tx)
            .await?;

            match inserted {
                Some(id) => results.push(EnqueueResult::Created(id)),
                None => {
                    let existing: Uuid = sqlx::query_scalar(
                        r#"
                        SELECT id FROM dispatch_jobs
                        WHERE task_id = $1 AND status IN ('pending', 'in_progress')
                        LIMIT 1
                        "#,
                    )
                    .bind(task_uuid)
                    .fetch_one(&mut *tx)
                    .await?;
                    results.push(EnqueueResult::Duplicate(existing));
                }
            }
        }

        tx.commit().await?;
        Ok(results)
    }

    async fn claim(&self, limit: i64) -> Result<Vec<DispatchJob>, DialerError> {
        let jobs = sqlx::query_as::<_, DispatchJob>(
            r#"
            WITH next_jobs AS (
                SELECT id
                FROM dispatch_jobs
                WHERE status = 'pending' AND next_attempt_at <= NOW()
                ORDER BY next_attempt_at, id
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE dispatch_jobs
            SET status = 'in_progress', updated_at = NOW()
            WHERE id IN (SELECT id FROM next_jobs)
            RETURNING id, task_id, status, attempt, max_attempts, next_attempt_at
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn mark_done(&self, job_id: Uuid) -> Result<(), DialerError> {
        sqlx::query("UPDATE dispatch_jobs SET status = 'done', updated_at = NOW() WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_failed(&self, job_id: Uuid, error: &str) -> Result<(), DialerError> {
        let row: (i32, i32) = sqlx::query_as(
            "SELECT attempt, max_attempts FROM dispatch_jobs WHERE id = $1",
        )
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;
        let (attempt, max_attempts) = row;

        if attempt + 1 < max_attempts {
            let delay_secs = backoff_delay_secs(self.base_delay, attempt);
            sqlx::query(
                r#"
                UPDATE dispatch_jobs
                SET status = 'pending',
                    attempt = attempt + 1,
                    next_attempt_at = NOW() + make_interval(secs => $1),
                    last_error = $2,
                    updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(delay_secs)
            .bind(error)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                r#"
                UPDATE dispatch_jobs
                SET status = 'dead_letter', last_error = $1, updated_at = NOW()
                WHERE id = $2
                "#,
            )
            .bind(error)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }
}

/// Exponential backoff for the dispatch queue's own infra-retry:
/// `base_delay * 2^attempt`. `attempt` is 0-indexed (the attempt number
/// *before* the one about to be scheduled).
fn backoff_delay_secs(base_delay: std::time::Duration, attempt: i32) -> f64 {
    base_delay.as_secs_f64() * 2f64.powi(attempt)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use uuid::Uuid;

    use super::{backoff_delay_secs, EnqueueResult};

    #[test]
    fn job_id_unwraps_either_variant() {
        let created_id = Uuid::new_v4();
        let duplicate_id = Uuid::new_v4();

        assert_eq!(EnqueueResult::Created(created_id).job_id(), created_id);
        assert_eq!(EnqueueResult::Duplicate(duplicate_id).job_id(), duplicate_id);
    }

    #[test]
    fn backoff_doubles_each_attempt() {
        let base = Duration::from_secs(5);

        assert_eq!(backoff_delay_secs(base, 0), 5.0);
        assert_eq!(backoff_delay_secs(base, 1), 10.0);
        assert_eq!(backoff_delay_secs(base, 2), 20.0);
    }
}
