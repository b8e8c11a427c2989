use async_trait::async_trait;
use guestbook_core::AppResult;
use guestbook_domain::{DeletionJob, DeletionJobId};

/// Queued deletion job leased to one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedDeletionJob {
    /// Job identifier.
    pub job_id: DeletionJobId,
    /// Job parameters as enqueued.
    pub job: DeletionJob,
    /// 1-based attempt number of this lease.
    pub attempt: u32,
    /// Attempts allowed before the job is dead-lettered.
    pub max_attempts: u32,
    /// Lease token used for fencing-token completion checks.
    pub lease_token: String,
}

/// Queue state after a failed attempt was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionJobFailureOutcome {
    /// Job returned to the queue for another attempt.
    Rescheduled,
    /// Job exhausted its attempts and will not run again.
    DeadLettered,
}

/// Worker-side port of the deletion job queue.
#[async_trait]
pub trait DeletionJobQueue: Send + Sync {
    /// Claims due jobs for one worker with a bounded lease.
    async fn claim_jobs(
        &self,
        worker_id: &str,
        limit: usize,
        lease_seconds: u32,
    ) -> AppResult<Vec<ClaimedDeletionJob>>;

    /// Marks one leased job as completed.
    async fn complete_job(
        &self,
        job_id: DeletionJobId,
        worker_id: &str,
        lease_token: &str,
    ) -> AppResult<()>;

    /// Records one failed attempt, rescheduling the job after
    /// `retry_after_seconds` or dead-lettering it when attempts are exhausted.
    async fn fail_job(
        &self,
        job_id: DeletionJobId,
        worker_id: &str,
        lease_token: &str,
        error_message: &str,
        retry_after_seconds: u32,
    ) -> AppResult<DeletionJobFailureOutcome>;
}
