//! The campaign status aggregator: a derived value computed on demand
//! from durable task state rather than maintained as a counter, since
//! pausing, retries, and partial failures interact in ways a single
//! stored field would drift on.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Paused,
    InProgress,
    Failed,
    Completed,
}

/// Per-status task counts for one campaign, as returned by the gateway's
/// `aggregate_campaign_status` query.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskStatusCounts {
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub failed: i64,
}

impl TaskStatusCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.in_progress + self.completed + self.failed
    }
}

/// Derives a campaign's status from its `is_paused` flag and its
/// tasks' status counts, per spec.md §4.7.
pub fn aggregate_campaign_status(is_paused: bool, counts: TaskStatusCounts) -> CampaignStatus {
    if is_paused {
        return CampaignStatus::Paused;
    }
    if counts.total() == 0 {
        return CampaignStatus::Paused;
    }
    if counts.failed > 0 {
        return CampaignStatus::Failed;
    }
    if counts.pending > 0 || counts.in_progress > 0 {
        return CampaignStatus::InProgress;
    }
    if counts.completed == counts.total() {
        return CampaignStatus::Completed;
    }
    CampaignStatus::Paused
}
