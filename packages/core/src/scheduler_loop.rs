//! The scheduler loop: claims due tasks and hands their ids to the
//! dispatch queue, per spec.md §4.5.
//!
//! Grounded in `fourthplaces-mntogether`'s
//! `kernel/jobs/worker.rs::Service::run` poll-sleep-select shape, swapped
//! from job-claim-and-execute to claim-and-enqueue since the scheduler
//! never executes a task itself.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Duration as ChronoDuration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::common::TaskId;
use crate::kernel::{DialerGateway, DispatchQueue, Service};

pub struct SchedulerLoop {
    gateway: Arc<dyn DialerGateway>,
    dispatch_queue: Arc<dyn DispatchQueue>,
    tick: Duration,
    batch_size: i64,
}

impl SchedulerLoop {
    pub fn new(
        gateway: Arc<dyn DialerGateway>,
        dispatch_queue: Arc<dyn DispatchQueue>,
        tick: Duration,
        batch_size: i64,
    ) -> Self {
        Self {
            gateway,
            dispatch_queue,
            tick,
            batch_size,
        }
    }

    /// The look-ahead horizon, per spec.md §4.5: a small buffer beyond
    /// one tick so no task's activation is missed between ticks.
    fn horizon(&self) -> ChronoDuration {
        ChronoDuration::seconds(self.tick.as_secs() as i64) + ChronoDuration::minutes(1)
    }

    async fn tick_once(&self) -> Result<usize> {
        let claimed = self.gateway.claim_due(self.batch_size, self.horizon()).await?;
        if claimed.is_empty() {
            return Ok(0);
        }

        let task_ids: Vec<TaskId> = claimed.iter().map(|t| t.id).collect();
        let count = task_ids.len();
        self.dispatch_queue.enqueue_many(&task_ids).await?;

        Ok(count)
    }
}

#[async_trait::async_trait]
impl Service for SchedulerLoop {
    fn name(&self) -> &'static str {
        "scheduler-loop"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        info!(tick_secs = self.tick.as_secs(), batch_size = self.batch_size, "scheduler loop starting");

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self.tick_once().await {
                Ok(0) => {}
                Ok(count) => info!(count, "claimed and enqueued due tasks"),
                Err(e) => error!(error = %e, "scheduler tick failed"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.tick) => {}
            }
        }

        info!("scheduler loop stopped");
        Ok(())
    }
}
