//! Schedule rules and the pure window-evaluation algorithm that tells
//! the scheduler loop and worker pool when a task is next allowed to run.

mod evaluator;
mod models;

pub use evaluator::next_valid;
pub use models::{RawScheduleRules, ScheduleRules};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{ScheduleId, UserId};

/// A named, reusable recurrence rule a campaign's tasks are evaluated against.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Schedule {
    pub id: ScheduleId,
    pub owner_id: UserId,
    pub name: String,
    pub timezone: String,
    pub rules: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    /// Parses `self.timezone` and `self.rules` into the typed values the
    /// evaluator consumes, rejecting malformed data at the boundary
    /// rather than deep inside the scheduler loop.
    pub fn typed_rules(&self) -> Result<(chrono_tz::Tz, ScheduleRules), crate::common::DialerError> {
        let tz: chrono_tz::Tz = self.timezone.parse().map_err(|_| {
            crate::common::DialerError::InvalidSchedule(format!(
                "unrecognized IANA timezone: {}",
                self.timezone
            ))
        })?;
        let rules = ScheduleRules::try_from(self.rules.clone())?;
        Ok((tz, rules))
    }
}
