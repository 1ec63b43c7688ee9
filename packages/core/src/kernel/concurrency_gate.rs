//! Per-campaign concurrency ceiling backed by a shared Redis counter —
//! the one piece of non-durable state in the execution plane, per
//! spec.md §4.3.

use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::error;

use crate::common::{CampaignId, DialerError};

#[async_trait::async_trait]
pub trait ConcurrencyGate: Send + Sync {
    /// Atomic increment-then-compare: increments the campaign's active
    /// counter; if it now exceeds `cap`, decrements back and returns
    /// `false`, otherwise returns `true`.
    async fn try_acquire(&self, campaign_id: CampaignId, cap: i64) -> Result<bool, DialerError>;

    /// Decrements the campaign's active counter.
    async fn release(&self, campaign_id: CampaignId) -> Result<(), DialerError>;
}

#[derive(Clone)]
pub struct RedisConcurrencyGate {
    redis: ConnectionManager,
}

impl RedisConcurrencyGate {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn key(campaign_id: CampaignId) -> String {
        format!("campaign:{campaign_id}:active")
    }
}

#[async_trait::async_trait]
impl ConcurrencyGate for RedisConcurrencyGate {
    async fn try_acquire(&self, campaign_id: CampaignId, cap: i64) -> Result<bool, DialerError> {
        let mut conn = self.redis.clone();
        let key = Self::key(campaign_id);

        let count: i64 = conn.incr(&key, 1).await?;
        if count > cap {
            let _: i64 = conn.decr(&key, 1).await?;
            return Ok(false);
        }
        Ok(true)
    }

    async fn release(&self, campaign_id: CampaignId) -> Result<(), DialerError> {
        let mut conn = self.redis.clone();
        let _: i64 = conn.decr(Self::key(campaign_id), 1).await?;
        Ok(())
    }
}

/// A held concurrency slot. Releases on every exit path — including a
/// worker task panicking mid-call — by spawning its release on `Drop`
/// unless `release` was already awaited explicitly.
pub struct ConcurrencySlot {
    gate: Arc<dyn ConcurrencyGate>,
    campaign_id: CampaignId,
    released: bool,
}

impl ConcurrencySlot {
    /// Attempts to acquire a slot for `campaign_id` under `cap`. Returns
    /// `None` if the cap is currently exhausted.
    pub async fn acquire(
        gate: Arc<dyn ConcurrencyGate>,
        campaign_id: CampaignId,
        cap: i64,
    ) -> Result<Option<Self>, DialerError> {
        if gate.try_acquire(campaign_id, cap).await? {
            Ok(Some(Self {
                gate,
                campaign_id,
                released: false,
            }))
        } else {
            Ok(None)
        }
    }

    /// Releases the slot explicitly, propagating any Redis error to the
    /// caller instead of only logging it as `Drop` would.
    pub async fn release(mut self) -> Result<(), DialerError> {
        self.released = true;
        self.gate.release(self.campaign_id).await
    }
}

impl Drop for ConcurrencySlot {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let gate = self.gate.clone();
        let campaign_id = self.campaign_id;
        tokio::spawn(async move {
            if let Err(e) = gate.release(campaign_id).await {
                error!(campaign_id = %campaign_id, error = %e, "failed to release concurrency slot");
            }
        });
    }
}
