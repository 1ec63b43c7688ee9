use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{CampaignId, PhoneNumberId, TaskId, UserId};

/// Per spec.md §9's resolution of the source's enum inconsistency: the
/// schema value wins, so the in-flight variant serializes as the
/// hyphenated `in-progress`, not `in_progress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    #[sqlx(rename = "in-progress")]
    #[serde(rename = "in-progress")]
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub campaign_id: CampaignId,
    pub phone_number_id: PhoneNumberId,
    pub status: TaskStatus,
    pub scheduled_at: DateTime<Utc>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The coherent task + campaign + schedule + phone-number snapshot the
/// worker pool's LOAD step fetches in a single join, per SPEC_FULL.md's
/// "keep the join at the gateway layer" redesign note.
#[derive(Debug, Clone)]
pub struct ClaimedTask {
    pub task: Task,
    pub campaign: crate::domains::campaign::Campaign,
    pub schedule: crate::domains::schedule::Schedule,
    pub phone_number: crate::domains::phone_number::PhoneNumber,
}
