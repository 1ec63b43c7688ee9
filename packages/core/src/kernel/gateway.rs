//! The State Store Gateway: a typed adapter over the relational store,
//! per spec.md §4.2. Every operation that can observe or mutate more
//! than one row executes inside a single transaction, and the
//! task→campaign→schedule→phone-number join lives here rather than
//! being reassembled by callers, per spec.md §9's "keep the join at the
//! gateway layer" redesign note.
//!
//! Grounded in `fourthplaces-mntogether`'s
//! `kernel/jobs/job.rs::claim_jobs` for the `FOR UPDATE SKIP LOCKED`
//! claim CTE and `kernel/jobs/job_store.rs` for the transactional
//! terminal-transition shape.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{CallLogId, CampaignId, DialerError, TaskId};
use crate::domains::call_log::{CallLog, CallLogStatus};
use crate::domains::campaign::{Campaign, TaskStatusCounts};
use crate::domains::phone_number::PhoneNumber;
use crate::domains::schedule::Schedule;
use crate::domains::task::{ClaimedTask, Task, TaskStatus};

#[async_trait::async_trait]
pub trait DialerGateway: Send + Sync {
    /// Atomically claims up to `limit` due tasks, flipping
    /// `pending -> in-progress`. This is the single serialization point
    /// preventing two scheduler replicas from claiming the same task.
    async fn claim_due(&self, limit: i64, horizon: ChronoDuration) -> Result<Vec<Task>, DialerError>;

    /// Fetches the coherent task + campaign + schedule + phone-number
    /// snapshot a worker needs to execute, or `None` if the task row no
    /// longer exists.
    async fn load_claimed_task(&self, task_id: TaskId) -> Result<Option<ClaimedTask>, DialerError>;

    async fn create_log(
        &self,
        task: &Task,
        dialed_number: &str,
        external_call_id: &str,
    ) -> Result<CallLog, DialerError>;

    async fn complete_task(&self, task_id: TaskId, call_log_id: CallLogId) -> Result<(), DialerError>;

    /// Reschedules without bumping `retry_count` — used on concurrency
    /// denial, which never placed a call.
    async fn reschedule_task(
        &self,
        task_id: TaskId,
        new_scheduled_at: DateTime<Utc>,
    ) -> Result<(), DialerError>;

    /// Reschedules after a place-failure, bumping `retry_count` and the
    /// campaign's `retries_attempted`.
    async fn retry_task(
        &self,
        task_id: TaskId,
        new_scheduled_at: DateTime<Utc>,
    ) -> Result<(), DialerError>;

    async fn fail_task(&self, task_id: TaskId) -> Result<(), DialerError>;

    async fn aggregate_campaign_status(
        &self,
        campaign_id: CampaignId,
    ) -> Result<(bool, TaskStatusCounts), DialerError>;
}

pub struct PgDialerGateway {
    pool: PgPool,
}

impl PgDialerGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DialerGateway for PgDialerGateway {
    async fn claim_due(&self, limit: i64, horizon: ChronoDuration) -> Result<Vec<Task>, DialerError> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            WITH due_tasks AS (
                SELECT t.id
                FROM tasks t
                JOIN campaigns c ON c.id = t.campaign_id
                WHERE t.status = 'pending'
                  AND c.is_paused = false
                  AND t.scheduled_at <= NOW() + make_interval(secs => $2)
                ORDER BY t.scheduled_at ASC, t.id ASC
                LIMIT $1
                FOR UPDATE OF t SKIP LOCKED
            )
            UPDATE tasks
            SET status = 'in-progress', updated_at = NOW()
            WHERE id IN (SELECT id FROM due_tasks)
            RETURNING id, user_id, campaign_id, phone_number_id, status,
                      scheduled_at, retry_count, created_at, updated_at
            "#,
        )
        .bind(limit)
        .bind(horizon.num_seconds() as f64)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn load_claimed_task(&self, task_id: TaskId) -> Result<Option<ClaimedTask>, DialerError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, campaign_id, phone_number_id, status,
                   scheduled_at, retry_count, created_at, updated_at
            FROM tasks WHERE id = $1
            "#,
        )
        .bind(task_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(task) = task else {
            return Ok(None);
        };

        let campaign = sqlx::query_as::<_, Campaign>(
            r#"
            SELECT id, user_id, schedule_id, is_paused, max_concurrent_calls,
                   max_retries, retry_delay_seconds, total_tasks, completed_tasks,
                   failed_tasks, retries_attempted, created_at, updated_at
            FROM campaigns WHERE id = $1
            "#,
        )
        .bind(task.campaign_id.into_uuid())
        .fetch_one(&self.pool)
        .await?;

        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT id, owner_id, name, timezone, rules, created_at, updated_at
            FROM schedules WHERE id = $1
            "#,
        )
        .bind(campaign.schedule_id.into_uuid())
        .fetch_one(&self.pool)
        .await?;

        let phone_number = sqlx::query_as::<_, PhoneNumber>(
            r#"
            SELECT id, user_id, number, status, created_at, updated_at
            FROM phone_numbers WHERE id = $1
            "#,
        )
        .bind(task.phone_number_id.into_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(ClaimedTask {
            task,
            campaign,
            schedule,
            phone_number,
        }))
    }

    async fn create_log(
        &self,
        task: &Task,
        dialed_number: &str,
        external_call_id: &str,
    ) -> Result<CallLog, DialerError> {
        let log = sqlx::query_as::<_, CallLog>(
            r#"
            INSERT INTO call_logs
                (id, user_id, call_task_id, phone_number_id, dialed_number,
                 external_call_id, status, started_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, 'initiated', NOW())
            RETURNING id, user_id, call_task_id, phone_number_id, dialed_number,
                      external_call_id, status, started_at, ended_at
            "#,
        )
        .bind(task.user_id.into_uuid())
        .bind(task.id.into_uuid())
        .bind(task.phone_number_id.into_uuid())
        .bind(dialed_number)
        .bind(external_call_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(log)
    }

    async fn complete_task(&self, task_id: TaskId, call_log_id: CallLogId) -> Result<(), DialerError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE call_logs SET status = $1, ended_at = NOW() WHERE id = $2",
        )
        .bind(CallLogStatus::Completed)
        .bind(call_log_id.into_uuid())
        .execute(&mut *tx)
        .await?;

        let campaign_id: Uuid = sqlx::query_scalar(
            "UPDATE tasks SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING campaign_id",
        )
        .bind(TaskStatus::Completed)
        .bind(task_id.into_uuid())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE campaigns SET completed_tasks = completed_tasks + 1, updated_at = NOW() WHERE id = $1")
            .bind(campaign_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn reschedule_task(
        &self,
        task_id: TaskId,
        new_scheduled_at: DateTime<Utc>,
    ) -> Result<(), DialerError> {
        sqlx::query(
            "UPDATE tasks SET status = $1, scheduled_at = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(TaskStatus::Pending)
        .bind(new_scheduled_at)
        .bind(task_id.into_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn retry_task(
        &self,
        task_id: TaskId,
        new_scheduled_at: DateTime<Utc>,
    ) -> Result<(), DialerError> {
        let mut tx = self.pool.begin().await?;

        let campaign_id: Uuid = sqlx::query_scalar(
            r#"
            UPDATE tasks
            SET status = $1, scheduled_at = $2, retry_count = retry_count + 1, updated_at = NOW()
            WHERE id = $3
            RETURNING campaign_id
            "#,
        )
        .bind(TaskStatus::Pending)
        .bind(new_scheduled_at)
        .bind(task_id.into_uuid())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE campaigns SET retries_attempted = retries_attempted + 1, updated_at = NOW() WHERE id = $1")
            .bind(campaign_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn fail_task(&self, task_id: TaskId) -> Result<(), DialerError> {
        let mut tx = self.pool.begin().await?;

        let campaign_id: Uuid = sqlx::query_scalar(
            "UPDATE tasks SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING campaign_id",
        )
        .bind(TaskStatus::Failed)
        .bind(task_id.into_uuid())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE campaigns SET failed_tasks = failed_tasks + 1, updated_at = NOW() WHERE id = $1")
            .bind(campaign_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn aggregate_campaign_status(
        &self,
        campaign_id: CampaignId,
    ) -> Result<(bool, TaskStatusCounts), DialerError> {
        let is_paused: bool =
            sqlx::query_scalar("SELECT is_paused FROM campaigns WHERE id = $1")
                .bind(campaign_id.into_uuid())
                .fetch_one(&self.pool)
                .await?;

        let rows: Vec<(TaskStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM tasks WHERE campaign_id = $1 GROUP BY status",
        )
        .bind(campaign_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut counts = TaskStatusCounts::default();
        for (status, count) in rows {
            match status {
                TaskStatus::Pending => counts.pending = count,
                TaskStatus::InProgress => counts.in_progress = count,
                TaskStatus::Completed => counts.completed = count,
                TaskStatus::Failed => counts.failed = count,
            }
        }

        Ok((is_paused, counts))
    }
}
