use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{CampaignId, ScheduleId, UserId};

/// A user-scoped grouping of phone numbers dialed under a shared
/// schedule and shared execution parameters.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: CampaignId,
    pub user_id: UserId,
    pub schedule_id: ScheduleId,

    pub is_paused: bool,
    pub max_concurrent_calls: i32,
    pub max_retries: i32,
    pub retry_delay_seconds: i64,

    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub failed_tasks: i64,
    pub retries_attempted: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
