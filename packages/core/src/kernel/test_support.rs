//! In-memory fakes for the kernel traits, used by unit tests in place of
//! a live Postgres/Redis instance — same role as the teacher's
//! `extraction::stores::memory::MemoryStore`.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use uuid::Uuid;

use crate::common::{CallLogId, CampaignId, DialerError, PhoneNumberId, ScheduleId, TaskId, UserId};
use crate::domains::call_log::{CallLog, CallLogStatus};
use crate::domains::campaign::{Campaign, TaskStatusCounts};
use crate::domains::phone_number::{PhoneNumber, PhoneNumberStatus};
use crate::domains::schedule::Schedule;
use crate::domains::task::{ClaimedTask, Task, TaskStatus};

use super::concurrency_gate::ConcurrencyGate;
use super::dispatch_queue::{DispatchJob, DispatchJobStatus, DispatchQueue, EnqueueResult};
use super::gateway::DialerGateway;

/// A schedule whose window never closes, so worker-pool tests don't
/// depend on the wall-clock day/time they happen to run at.
pub(crate) fn always_open_schedule() -> Schedule {
    let rules = serde_json::json!({
        "days": ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"],
        "start_time": "00:00",
        "end_time": "23:59",
        "exclude_holidays": false,
    });
    Schedule {
        id: ScheduleId::new(),
        owner_id: UserId::new(),
        name: "always-open".into(),
        timezone: "UTC".into(),
        rules,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn sample_campaign(schedule_id: ScheduleId) -> Campaign {
    Campaign {
        id: CampaignId::new(),
        user_id: UserId::new(),
        schedule_id,
        is_paused: false,
        max_concurrent_calls: 1,
        max_retries: 2,
        retry_delay_seconds: 60,
        total_tasks: 1,
        completed_tasks: 0,
        failed_tasks: 0,
        retries_attempted: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn sample_phone_number() -> PhoneNumber {
    PhoneNumber {
        id: PhoneNumberId::new(),
        user_id: UserId::new(),
        number: "+15551234567".into(),
        status: PhoneNumberStatus::Valid,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn sample_task(campaign_id: CampaignId, phone_number_id: PhoneNumberId) -> Task {
    Task {
        id: TaskId::new(),
        user_id: UserId::new(),
        campaign_id,
        phone_number_id,
        status: TaskStatus::InProgress,
        scheduled_at: Utc::now(),
        retry_count: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// An in-memory `DialerGateway`. Mutates its maps the way the real
/// Postgres-backed gateway mutates rows, so assertions can read state
/// back out after exercising the worker pool / scheduler loop against it.
#[derive(Default)]
pub(crate) struct MockGateway {
    pub tasks: Mutex<HashMap<Uuid, Task>>,
    pub campaigns: Mutex<HashMap<Uuid, Campaign>>,
    pub schedules: Mutex<HashMap<Uuid, Schedule>>,
    pub phone_numbers: Mutex<HashMap<Uuid, PhoneNumber>>,
    pub call_logs: Mutex<Vec<CallLog>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_task(&self, task: Task) {
        self.tasks.lock().unwrap().insert(task.id.into_uuid(), task);
    }

    pub fn insert_campaign(&self, campaign: Campaign) {
        self.campaigns
            .lock()
            .unwrap()
            .insert(campaign.id.into_uuid(), campaign);
    }

    pub fn insert_schedule(&self, schedule: Schedule) {
        self.schedules
            .lock()
            .unwrap()
            .insert(schedule.id.into_uuid(), schedule);
    }

    pub fn insert_phone_number(&self, phone_number: PhoneNumber) {
        self.phone_numbers
            .lock()
            .unwrap()
            .insert(phone_number.id.into_uuid(), phone_number);
    }

    pub fn task(&self, id: TaskId) -> Task {
        self.tasks.lock().unwrap().get(&id.into_uuid()).unwrap().clone()
    }

    pub fn campaign(&self, id: CampaignId) -> Campaign {
        self.campaigns
            .lock()
            .unwrap()
            .get(&id.into_uuid())
            .unwrap()
            .clone()
    }
}

#[async_trait::async_trait]
impl DialerGateway for MockGateway {
    async fn claim_due(&self, limit: i64, horizon: ChronoDuration) -> Result<Vec<Task>, DialerError> {
        let mut tasks = self.tasks.lock().unwrap();
        let campaigns = self.campaigns.lock().unwrap();
        let cutoff = Utc::now() + horizon;

        let mut due: Vec<Uuid> = tasks
            .values()
            .filter(|t| {
                t.status == TaskStatus::Pending
                    && t.scheduled_at <= cutoff
                    && campaigns
                        .get(&t.campaign_id.into_uuid())
                        .map(|c| !c.is_paused)
                        .unwrap_or(false)
            })
            .map(|t| t.id.into_uuid())
            .collect();
        due.sort();
        due.truncate(limit as usize);

        let mut claimed = Vec::with_capacity(due.len());
        for id in due {
            let task = tasks.get_mut(&id).unwrap();
            task.status = TaskStatus::InProgress;
            claimed.push(task.clone());
        }
        Ok(claimed)
    }

    async fn load_claimed_task(&self, task_id: TaskId) -> Result<Option<ClaimedTask>, DialerError> {
        let Some(task) = self.tasks.lock().unwrap().get(&task_id.into_uuid()).cloned() else {
            return Ok(None);
        };
        let campaign = self
            .campaigns
            .lock()
            .unwrap()
            .get(&task.campaign_id.into_uuid())
            .unwrap()
            .clone();
        let schedule = self
            .schedules
            .lock()
            .unwrap()
            .get(&campaign.schedule_id.into_uuid())
            .unwrap()
            .clone();
        let phone_number = self
            .phone_numbers
            .lock()
            .unwrap()
            .get(&task.phone_number_id.into_uuid())
            .unwrap()
            .clone();

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
        let log = CallLog {
            id: CallLogId::new(),
            user_id: task.user_id,
            call_task_id: task.id,
            phone_number_id: task.phone_number_id,
            dialed_number: dialed_number.to_string(),
            external_call_id: external_call_id.to_string(),
            status: CallLogStatus::Initiated,
            started_at: Utc::now(),
            ended_at: None,
        };
        self.call_logs.lock().unwrap().push(log.clone());
        Ok(log)
    }

    async fn complete_task(&self, task_id: TaskId, _call_log_id: CallLogId) -> Result<(), DialerError> {
        let campaign_id = {
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks.get_mut(&task_id.into_uuid()).unwrap();
            task.status = TaskStatus::Completed;
            task.campaign_id.into_uuid()
        };
        self.campaigns
            .lock()
            .unwrap()
            .get_mut(&campaign_id)
            .unwrap()
            .completed_tasks += 1;
        Ok(())
    }

    async fn reschedule_task(
        &self,
        task_id: TaskId,
        new_scheduled_at: DateTime<Utc>,
    ) -> Result<(), DialerError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.get_mut(&task_id.into_uuid()).unwrap();
        task.status = TaskStatus::Pending;
        task.scheduled_at = new_scheduled_at;
        Ok(())
    }

    async fn retry_task(
        &self,
        task_id: TaskId,
        new_scheduled_at: DateTime<Utc>,
    ) -> Result<(), DialerError> {
        let campaign_id = {
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks.get_mut(&task_id.into_uuid()).unwrap();
            task.status = TaskStatus::Pending;
            task.scheduled_at = new_scheduled_at;
            task.retry_count += 1;
            task.campaign_id.into_uuid()
        };
        self.campaigns
            .lock()
            .unwrap()
            .get_mut(&campaign_id)
            .unwrap()
            .retries_attempted += 1;
        Ok(())
    }

    async fn fail_task(&self, task_id: TaskId) -> Result<(), DialerError> {
        let campaign_id = {
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks.get_mut(&task_id.into_uuid()).unwrap();
            task.status = TaskStatus::Failed;
            task.campaign_id.into_uuid()
        };
        self.campaigns
            .lock()
            .unwrap()
            .get_mut(&campaign_id)
            .unwrap()
            .failed_tasks += 1;
        Ok(())
    }

    async fn aggregate_campaign_status(
        &self,
        campaign_id: CampaignId,
    ) -> Result<(bool, TaskStatusCounts), DialerError> {
        let is_paused = self
            .campaigns
            .lock()
            .unwrap()
            .get(&campaign_id.into_uuid())
            .unwrap()
            .is_paused;

        let mut counts = TaskStatusCounts::default();
        for task in self.tasks.lock().unwrap().values() {
            if task.campaign_id != campaign_id {
                continue;
            }
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
        }
        Ok((is_paused, counts))
    }
}

/// An in-memory `DispatchQueue`.
#[derive(Default)]
pub(crate) struct MockDispatchQueue {
    pub jobs: Mutex<HashMap<Uuid, DispatchJob>>,
    pub enqueued: Mutex<Vec<TaskId>>,
    pub done: Mutex<Vec<Uuid>>,
    pub failed: Mutex<Vec<(Uuid, String)>>,
}

impl MockDispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, task_id: TaskId) -> Uuid {
        let id = Uuid::new_v4();
        self.jobs.lock().unwrap().insert(
            id,
            DispatchJob {
                id,
                task_id: task_id.into_uuid(),
                status: DispatchJobStatus::Pending,
                attempt: 0,
                max_attempts: 3,
                next_attempt_at: Utc::now(),
            },
        );
        id
    }
}

#[async_trait::async_trait]
impl DispatchQueue for MockDispatchQueue {
    async fn enqueue_many(&self, task_ids: &[TaskId]) -> Result<Vec<EnqueueResult>, DialerError> {
        let mut jobs = self.jobs.lock().unwrap();
        let mut enqueued = self.enqueued.lock().unwrap();
        let mut results = Vec::with_capacity(task_ids.len());

        for task_id in task_ids {
            enqueued.push(*task_id);
            let existing = jobs.values().find(|j| {
                j.task_id == task_id.into_uuid()
                    && matches!(j.status, DispatchJobStatus::Pending | DispatchJobStatus::InProgress)
            });
            if let Some(job) = existing {
                results.push(EnqueueResult::Duplicate(job.id));
                continue;
            }
            let id = Uuid::new_v4();
            jobs.insert(
                id,
                DispatchJob {
                    id,
                    task_id: task_id.into_uuid(),
                    status: DispatchJobStatus::Pending,
                    attempt: 0,
                    max_attempts: 3,
                    next_attempt_at: Utc::now(),
                },
            );
            results.push(EnqueueResult::Created(id));
        }

        Ok(results)
    }

    async fn claim(&self, limit: i64) -> Result<Vec<DispatchJob>, DialerError> {
        let mut jobs = self.jobs.lock().unwrap();
        let now = Utc::now();
        let mut ids: Vec<Uuid> = jobs
            .values()
            .filter(|j| j.status == DispatchJobStatus::Pending && j.next_attempt_at <= now)
            .map(|j| j.id)
            .collect();
        ids.sort();
        ids.truncate(limit as usize);

        let mut claimed = Vec::with_capacity(ids.len());
        for id in ids {
            let job = jobs.get_mut(&id).unwrap();
            job.status = DispatchJobStatus::InProgress;
            claimed.push(job.clone());
        }
        Ok(claimed)
    }

    async fn mark_done(&self, job_id: Uuid) -> Result<(), DialerError> {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            job.status = DispatchJobStatus::Done;
        }
        self.done.lock().unwrap().push(job_id);
        Ok(())
    }

    async fn mark_failed(&self, job_id: Uuid, error: &str) -> Result<(), DialerError> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&job_id) {
            if job.attempt + 1 < job.max_attempts {
                job.attempt += 1;
                job.status = DispatchJobStatus::Pending;
            } else {
                job.status = DispatchJobStatus::DeadLetter;
            }
        }
        self.failed.lock().unwrap().push((job_id, error.to_string()));
        Ok(())
    }
}

/// An in-memory `ConcurrencyGate`, counting acquisitions per campaign the
/// same way `RedisConcurrencyGate` counts them via `INCR`/`DECR`.
#[derive(Default)]
pub(crate) struct MockConcurrencyGate {
    pub counts: Mutex<HashMap<Uuid, i64>>,
}

impl MockConcurrencyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self, campaign_id: CampaignId) -> i64 {
        *self
            .counts
            .lock()
            .unwrap()
            .get(&campaign_id.into_uuid())
            .unwrap_or(&0)
    }
}

#[async_trait::async_trait]
impl ConcurrencyGate for MockConcurrencyGate {
    async fn try_acquire(&self, campaign_id: CampaignId, cap: i64) -> Result<bool, DialerError> {
        let mut counts = self.counts.lock().unwrap();
        let entry = counts.entry(campaign_id.into_uuid()).or_insert(0);
        *entry += 1;
        if *entry > cap {
            *entry -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    async fn release(&self, campaign_id: CampaignId) -> Result<(), DialerError> {
        let mut counts = self.counts.lock().unwrap();
        if let Some(entry) = counts.get_mut(&campaign_id.into_uuid()) {
            *entry -= 1;
        }
        Ok(())
    }
}
