use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guestbook_core::AppResult;
use guestbook_domain::{DeletionJob, DeletionJobId};

/// Receipt returned once a deletion job has been accepted for later execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobHandle {
    /// Identifier of the accepted job.
    pub job_id: DeletionJobId,
    /// Acceptance timestamp.
    pub enqueued_at: DateTime<Utc>,
}

/// Port for deferring comment deletion to asynchronous execution.
///
/// Implementations return as soon as the job is accepted and never wait for
/// its outcome. A job that later finds nothing to delete is not a dispatch
/// failure.
#[async_trait]
pub trait DeletionJobDispatcher: Send + Sync {
    /// Enqueues one deletion job addressed to the deletion task callback.
    async fn enqueue_deletion(&self, job: DeletionJob) -> AppResult<JobHandle>;
}
