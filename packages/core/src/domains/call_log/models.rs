use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{CallLogId, PhoneNumberId, TaskId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "call_log_status", rename_all = "snake_case")]
pub enum CallLogStatus {
    #[default]
    Initiated,
    #[sqlx(rename = "in-progress")]
    #[serde(rename = "in-progress")]
    InProgress,
    Completed,
    Failed,
}

/// The audit record of a single placement attempt against the external
/// placer. `(task_id)` holds at most one non-terminal row at a time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CallLog {
    pub id: CallLogId,
    pub user_id: UserId,
    pub call_task_id: TaskId,
    pub phone_number_id: PhoneNumberId,
    pub dialed_number: String,
    pub external_call_id: String,
    pub status: CallLogStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}
