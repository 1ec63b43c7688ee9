//! The worker pool: dequeues claimed task-ids and drives each through
//! the per-task state machine in spec.md §4.6.
//!
//! Grounded in `fourthplaces-mntogether`'s `kernel/jobs/worker.rs`
//! (`JobWorker`) for the claim/spawn/drain shape, with the pool's own
//! concurrency bound (`tokio::sync::Semaphore`) and rate cap
//! (`governor`) standing in for the job worker's batch-size poll loop,
//! per spec.md §5's explicit scheduling model.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use governor::{Quota, RateLimiter};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use placer::{Placer, PlaceOutcome};

use crate::common::TaskId;
use crate::domains::task::TaskStatus;
use crate::kernel::{ConcurrencyGate, ConcurrencySlot, DialerGateway, DispatchQueue, Service};

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

struct WorkerContext {
    gateway: Arc<dyn DialerGateway>,
    dispatch_queue: Arc<dyn DispatchQueue>,
    concurrency_gate: Arc<dyn ConcurrencyGate>,
    placer: Arc<dyn Placer>,
}

pub struct WorkerPool {
    ctx: Arc<WorkerContext>,
    concurrency: usize,
    rate_limiter: Arc<DirectRateLimiter>,
    poll_interval: Duration,
    claim_batch: i64,
}

impl WorkerPool {
    pub fn new(
        gateway: Arc<dyn DialerGateway>,
        dispatch_queue: Arc<dyn DispatchQueue>,
        concurrency_gate: Arc<dyn ConcurrencyGate>,
        placer: Arc<dyn Placer>,
        concurrency: usize,
        rate_per_minute: u32,
    ) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(rate_per_minute.max(1)).unwrap());
        Self {
            ctx: Arc::new(WorkerContext {
                gateway,
                dispatch_queue,
                concurrency_gate,
                placer,
            }),
            concurrency,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            poll_interval: Duration::from_millis(500),
            claim_batch: concurrency as i64,
        }
    }
}

#[async_trait::async_trait]
impl Service for WorkerPool {
    fn name(&self) -> &'static str {
        "worker-pool"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        info!(concurrency = self.concurrency, "worker pool starting");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::new();

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let jobs = match self.ctx.dispatch_queue.claim(self.claim_batch).await {
                Ok(jobs) => jobs,
                Err(e) => {
                    error!(error = %e, "failed to claim dispatch jobs");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            if jobs.is_empty() {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
                continue;
            }

            for job in jobs {
                self.rate_limiter.until_ready().await;

                let permit = match semaphore.clone().acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => break,
                };
                let ctx = self.ctx.clone();
                let job_id = job.id;
                let task_id = TaskId::from_uuid(job.task_id);

                handles.push(tokio::spawn(async move {
                    let _permit = permit;
                    process_task(ctx.clone(), task_id, job_id).await;
                }));
            }

            handles.retain(|h| !h.is_finished());
        }

        let pending = handles.len();
        if pending > 0 {
            info!(count = pending, "waiting for in-flight tasks to drain");
            futures::future::join_all(handles).await;
        }

        info!("worker pool stopped");
        Ok(())
    }
}

/// Executes the per-task state machine of spec.md §4.6 for one claimed
/// task-id: LOAD, GATE, LOG, PLACE, and release on every exit path.
async fn process_task(ctx: Arc<WorkerContext>, task_id: TaskId, job_id: Uuid) {
    let claimed = match ctx.gateway.load_claimed_task(task_id).await {
        Ok(Some(claimed)) if claimed.task.status == TaskStatus::InProgress => claimed,
        Ok(_) => {
            warn!(task_id = %task_id, "task row missing or no longer in-progress, acking as orphan");
            let _ = ctx.dispatch_queue.mark_done(job_id).await;
            return;
        }
        Err(e) => {
            error!(task_id = %task_id, error = %e, "failed to load claimed task");
            let _ = ctx.dispatch_queue.mark_failed(job_id, &e.to_string()).await;
            return;
        }
    };

    let (tz, rules) = match claimed.schedule.typed_rules() {
        Ok(parsed) => parsed,
        Err(e) => {
            error!(task_id = %task_id, error = %e, "invalid schedule rules, failing task");
            let _ = ctx.gateway.fail_task(task_id).await;
            let _ = ctx.dispatch_queue.mark_done(job_id).await;
            return;
        }
    };

    let cap = claimed.campaign.max_concurrent_calls as i64;
    let slot = match ConcurrencySlot::acquire(ctx.concurrency_gate.clone(), claimed.campaign.id, cap).await {
        Ok(Some(slot)) => slot,
        Ok(None) => {
            info!(task_id = %task_id, campaign_id = %claimed.campaign.id, "concurrency denied, rescheduling");
            let next = crate::domains::schedule::next_valid(&rules, tz, Utc::now())
                .unwrap_or_else(|| Utc::now() + chrono::Duration::minutes(1));
            if let Err(e) = ctx.gateway.reschedule_task(task_id, next).await {
                error!(task_id = %task_id, error = %e, "failed to reschedule after concurrency denial");
            }
            let _ = ctx.dispatch_queue.mark_done(job_id).await;
            return;
        }
        Err(e) => {
            error!(task_id = %task_id, error = %e, "concurrency gate error");
            let _ = ctx.dispatch_queue.mark_failed(job_id, &e.to_string()).await;
            return;
        }
    };

    let external_call_id = Uuid::new_v4().to_string();
    let log = match ctx
        .gateway
        .create_log(&claimed.task, &claimed.phone_number.number, &external_call_id)
        .await
    {
        Ok(log) => log,
        Err(e) => {
            error!(task_id = %task_id, error = %e, "failed to create call log");
            let _ = slot.release().await;
            let _ = ctx.dispatch_queue.mark_failed(job_id, &e.to_string()).await;
            return;
        }
    };

    let attempt = placer::CallAttempt {
        external_call_id: log.external_call_id.clone(),
        dialed_number: log.dialed_number.clone(),
    };
    let outcome = ctx.placer.place(&attempt).await;

    let place_result = match outcome {
        Ok(PlaceOutcome::Succeeded) => {
            info!(task_id = %task_id, "call succeeded");
            ctx.gateway.complete_task(task_id, log.id).await
        }
        Ok(PlaceOutcome::Failed) | Err(_) => {
            if claimed.task.retry_count < claimed.campaign.max_retries {
                let next = crate::domains::schedule::next_valid(&rules, tz, Utc::now());
                let delay_floor =
                    Utc::now() + chrono::Duration::seconds(claimed.campaign.retry_delay_seconds);
                let new_at = match next {
                    Some(n) => n.max(delay_floor),
                    None => delay_floor,
                };
                warn!(task_id = %task_id, retry_count = claimed.task.retry_count + 1, "call failed, retrying");
                ctx.gateway.retry_task(task_id, new_at).await
            } else {
                warn!(task_id = %task_id, "call failed, retries exhausted");
                ctx.gateway.fail_task(task_id).await
            }
        }
    };

    if let Err(e) = place_result {
        error!(task_id = %task_id, error = %e, "failed to commit terminal task transition");
    }

    if let Err(e) = slot.release().await {
        error!(task_id = %task_id, error = %e, "failed to release concurrency slot");
    }

    let _ = ctx.dispatch_queue.mark_done(job_id).await;
}
