use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use guestbook_application::{
    ClaimedDeletionJob, DeletionJobDispatcher, DeletionJobFailureOutcome, DeletionJobQueue,
    JobHandle,
};
use guestbook_core::{AppError, AppResult};
use guestbook_domain::{DeletionJob, DeletionJobId};
use tokio::sync::RwLock;

/// Number of completed or dead-lettered jobs kept for inspection.
pub const FINISHED_JOB_HISTORY_LIMIT: usize = 256;

/// Lifecycle state of a queued deletion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuedDeletionJobStatus {
    /// Waiting for a worker.
    Pending,
    /// Claimed by a worker under a lease.
    Leased,
    /// Deletion task acknowledged.
    Completed,
    /// Attempts exhausted.
    DeadLettered,
}

#[derive(Debug, Clone)]
struct QueuedDeletionJob {
    job_id: DeletionJobId,
    job: DeletionJob,
    status: QueuedDeletionJobStatus,
    attempts: u32,
    available_at: DateTime<Utc>,
    leased_by: Option<String>,
    lease_token: Option<String>,
    lease_expires_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl QueuedDeletionJob {
    fn holds_lease(&self, worker_id: &str, lease_token: &str) -> bool {
        self.status == QueuedDeletionJobStatus::Leased
            && self.leased_by.as_deref() == Some(worker_id)
            && self.lease_token.as_deref() == Some(lease_token)
    }

    fn release_lease(&mut self) {
        self.leased_by = None;
        self.lease_token = None;
        self.lease_expires_at = None;
    }

    fn is_finished(&self) -> bool {
        matches!(
            self.status,
            QueuedDeletionJobStatus::Completed | QueuedDeletionJobStatus::DeadLettered
        )
    }
}

#[derive(Debug, Default)]
struct QueueState {
    active: Vec<QueuedDeletionJob>,
    finished: VecDeque<QueuedDeletionJob>,
}

impl QueueState {
    fn find(&self, job_id: DeletionJobId) -> Option<&QueuedDeletionJob> {
        self.active
            .iter()
            .chain(self.finished.iter())
            .find(|entry| entry.job_id == job_id)
    }

    fn leased_mut(
        &mut self,
        job_id: DeletionJobId,
        worker_id: &str,
        lease_token: &str,
    ) -> AppResult<&mut QueuedDeletionJob> {
        self.active
            .iter_mut()
            .find(|entry| entry.job_id == job_id && entry.holds_lease(worker_id, lease_token))
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "deletion job '{job_id}' is not currently leased by worker '{worker_id}' with matching lease token"
                ))
            })
    }

    /// Moves finished jobs out of the active list, trimming the history.
    fn retire_finished(&mut self) {
        if !self.active.iter().any(QueuedDeletionJob::is_finished) {
            return;
        }

        let (finished, active): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(QueuedDeletionJob::is_finished);
        self.active = active;
        self.finished.extend(finished);

        while self.finished.len() > FINISHED_JOB_HISTORY_LIMIT {
            self.finished.pop_front();
        }
    }
}

/// In-memory deletion job queue.
///
/// Serves as dispatcher and worker queue inside a single process. Jobs are
/// lost on restart. Claims scan pending and leased jobs only; finished jobs
/// stay visible to [`InMemoryDeletionJobQueue::status_of`] until they fall
/// out of a history of [`FINISHED_JOB_HISTORY_LIMIT`] entries.
pub struct InMemoryDeletionJobQueue {
    state: RwLock<QueueState>,
    max_attempts: u32,
    accepting: AtomicBool,
}

impl InMemoryDeletionJobQueue {
    /// Creates an empty queue that dead-letters jobs after `max_attempts`.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: RwLock::new(QueueState::default()),
            max_attempts: max_attempts.max(1),
            accepting: AtomicBool::new(true),
        }
    }

    /// Stops or resumes accepting new jobs. A closed queue rejects enqueues
    /// with a dispatch error.
    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.store(accepting, Ordering::SeqCst);
    }

    /// Returns the retained jobs: finished history first, then pending and
    /// leased jobs in enqueue order.
    pub async fn enqueued_jobs(&self) -> Vec<DeletionJob> {
        let state = self.state.read().await;
        state
            .finished
            .iter()
            .chain(state.active.iter())
            .map(|entry| entry.job)
            .collect()
    }

    /// Number of jobs still pending or leased.
    pub async fn active_job_count(&self) -> usize {
        self.state.read().await.active.len()
    }

    /// Number of jobs held in memory, finished history included.
    pub async fn retained_job_count(&self) -> usize {
        let state = self.state.read().await;
        state.active.len() + state.finished.len()
    }

    /// Returns the current status of one job.
    pub async fn status_of(&self, job_id: DeletionJobId) -> Option<QueuedDeletionJobStatus> {
        self.state.read().await.find(job_id).map(|entry| entry.status)
    }

    /// Returns the last recorded failure for one job.
    pub async fn last_error_of(&self, job_id: DeletionJobId) -> Option<String> {
        self.state
            .read()
            .await
            .find(job_id)
            .and_then(|entry| entry.last_error.clone())
    }
}

impl Default for InMemoryDeletionJobQueue {
    fn default() -> Self {
        Self::new(5)
    }
}

#[async_trait]
impl DeletionJobDispatcher for InMemoryDeletionJobQueue {
    async fn enqueue_deletion(&self, job: DeletionJob) -> AppResult<JobHandle> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(AppError::Dispatch(
                "deletion job queue is not accepting jobs".to_owned(),
            ));
        }

        let now = Utc::now();
        let job_id = DeletionJobId::new();
        self.state.write().await.active.push(QueuedDeletionJob {
            job_id,
            job,
            status: QueuedDeletionJobStatus::Pending,
            attempts: 0,
            available_at: now,
            leased_by: None,
            lease_token: None,
            lease_expires_at: None,
            last_error: None,
        });

        Ok(JobHandle {
            job_id,
            enqueued_at: now,
        })
    }
}

#[async_trait]
impl DeletionJobQueue for InMemoryDeletionJobQueue {
    async fn claim_jobs(
        &self,
        worker_id: &str,
        limit: usize,
        lease_seconds: u32,
    ) -> AppResult<Vec<ClaimedDeletionJob>> {
        let now = Utc::now();
        let lease_expires_at = now + TimeDelta::seconds(i64::from(lease_seconds));
        let mut state = self.state.write().await;
        let mut claimed = Vec::new();

        for entry in &mut state.active {
            let lease_expired = entry.status == QueuedDeletionJobStatus::Leased
                && entry.lease_expires_at.is_some_and(|expires| expires < now);

            if lease_expired && entry.attempts >= self.max_attempts {
                entry.status = QueuedDeletionJobStatus::DeadLettered;
                entry.release_lease();
                entry
                    .last_error
                    .get_or_insert_with(|| "lease expired on final attempt".to_owned());
                continue;
            }

            let due = (entry.status == QueuedDeletionJobStatus::Pending
                && entry.available_at <= now)
                || lease_expired;
            if !due || claimed.len() >= limit {
                continue;
            }

            let lease_token = uuid::Uuid::new_v4().to_string();
            entry.status = QueuedDeletionJobStatus::Leased;
            entry.attempts = entry.attempts.saturating_add(1);
            entry.leased_by = Some(worker_id.to_owned());
            entry.lease_token = Some(lease_token.clone());
            entry.lease_expires_at = Some(lease_expires_at);

            claimed.push(ClaimedDeletionJob {
                job_id: entry.job_id,
                job: entry.job,
                attempt: entry.attempts,
                max_attempts: self.max_attempts,
                lease_token,
            });
        }
        state.retire_finished();

        Ok(claimed)
    }

    async fn complete_job(
        &self,
        job_id: DeletionJobId,
        worker_id: &str,
        lease_token: &str,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let entry = state.leased_mut(job_id, worker_id, lease_token)?;

        entry.status = QueuedDeletionJobStatus::Completed;
        entry.last_error = None;
        entry.release_lease();
        state.retire_finished();

        Ok(())
    }

    async fn fail_job(
        &self,
        job_id: DeletionJobId,
        worker_id: &str,
        lease_token: &str,
        error_message: &str,
        retry_after_seconds: u32,
    ) -> AppResult<DeletionJobFailureOutcome> {
        let mut state = self.state.write().await;
        let entry = state.leased_mut(job_id, worker_id, lease_token)?;

        entry.release_lease();
        entry.last_error = Some(error_message.to_owned());

        if entry.attempts >= self.max_attempts {
            entry.status = QueuedDeletionJobStatus::DeadLettered;
            state.retire_finished();
            return Ok(DeletionJobFailureOutcome::DeadLettered);
        }

        entry.status = QueuedDeletionJobStatus::Pending;
        entry.available_at = Utc::now() + TimeDelta::seconds(i64::from(retry_after_seconds));
        Ok(DeletionJobFailureOutcome::Rescheduled)
    }
}
