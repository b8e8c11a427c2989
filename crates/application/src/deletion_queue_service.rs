use std::sync::Arc;

use guestbook_core::{AppError, AppResult};
use guestbook_domain::DeletionJobId;

use crate::purge_ports::{
    ClaimedDeletionJob, DeletionJobFailureOutcome, DeletionJobQueue, DeletionTaskCallback,
};

/// One failed delivery from a worker claim cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionJobFailure {
    /// Job identifier.
    pub job_id: DeletionJobId,
    /// Attempt that failed.
    pub attempt: u32,
    /// Attempts allowed before the job is dead-lettered.
    pub max_attempts: u32,
    /// Rendered failure.
    pub error: String,
}

impl DeletionJobFailure {
    /// Returns true when this failure used up the job's last attempt.
    #[must_use]
    pub fn is_final_attempt(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// Counters and failures from one worker claim cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerCycleSummary {
    /// Jobs claimed in this cycle.
    pub claimed_jobs: u32,
    /// Jobs whose deletion task succeeded.
    pub executed_jobs: u32,
    /// Jobs whose deletion task failed.
    pub failed_jobs: u32,
    /// Failure details per job, for logging.
    pub failures: Vec<DeletionJobFailure>,
}

/// Worker-side service that drains the deletion job queue.
///
/// Each claimed job is delivered to the deletion task callback exactly once
/// per lease; retries are driven by the queue's attempt bookkeeping.
#[derive(Clone)]
pub struct DeletionQueueService {
    queue: Arc<dyn DeletionJobQueue>,
    callback: Arc<dyn DeletionTaskCallback>,
    retry_backoff_seconds: u32,
}

impl DeletionQueueService {
    /// Creates a queue service.
    #[must_use]
    pub fn new(
        queue: Arc<dyn DeletionJobQueue>,
        callback: Arc<dyn DeletionTaskCallback>,
        retry_backoff_seconds: u32,
    ) -> Self {
        Self {
            queue,
            callback,
            retry_backoff_seconds,
        }
    }

    /// Claims queued deletion jobs for one worker.
    pub async fn claim_jobs_for_worker(
        &self,
        worker_id: &str,
        limit: usize,
        lease_seconds: u32,
    ) -> AppResult<Vec<ClaimedDeletionJob>> {
        if worker_id.trim().is_empty() {
            return Err(AppError::Validation(
                "worker_id must not be empty".to_owned(),
            ));
        }

        if limit == 0 {
            return Err(AppError::Validation(
                "limit must be greater than zero".to_owned(),
            ));
        }

        if lease_seconds == 0 {
            return Err(AppError::Validation(
                "lease_seconds must be greater than zero".to_owned(),
            ));
        }

        self.queue.claim_jobs(worker_id, limit, lease_seconds).await
    }

    /// Delivers one claimed job to the deletion task and finalizes queue state.
    pub async fn execute_claimed_job(
        &self,
        worker_id: &str,
        claimed: ClaimedDeletionJob,
    ) -> AppResult<String> {
        if claimed.lease_token.trim().is_empty() {
            return Err(AppError::Validation(
                "claimed deletion job lease_token must not be empty".to_owned(),
            ));
        }

        let job_id = claimed.job_id;
        match self.callback.invoke_deletion_task(claimed.job).await {
            Ok(acknowledgement) => {
                self.queue
                    .complete_job(job_id, worker_id, claimed.lease_token.as_str())
                    .await?;
                Ok(acknowledgement)
            }
            Err(error) => {
                let retry_after_seconds = self
                    .retry_backoff_seconds
                    .saturating_mul(claimed.attempt.max(1));
                let outcome = self
                    .queue
                    .fail_job(
                        job_id,
                        worker_id,
                        claimed.lease_token.as_str(),
                        error.to_string().as_str(),
                        retry_after_seconds,
                    )
                    .await;

                match outcome {
                    Ok(DeletionJobFailureOutcome::Rescheduled) => Err(error),
                    Ok(DeletionJobFailureOutcome::DeadLettered) => {
                        Err(AppError::DeletionExecution(format!(
                            "deletion job '{job_id}' dead-lettered after {} attempts: {error}",
                            claimed.attempt
                        )))
                    }
                    Err(mark_error) => Err(AppError::Internal(format!(
                        "failed to execute deletion job '{job_id}': {error}; additionally failed to mark queue job failed: {mark_error}"
                    ))),
                }
            }
        }
    }

    /// Claims one batch and executes every job in it.
    pub async fn run_worker_cycle(
        &self,
        worker_id: &str,
        limit: usize,
        lease_seconds: u32,
    ) -> AppResult<WorkerCycleSummary> {
        let claimed_jobs = self
            .claim_jobs_for_worker(worker_id, limit, lease_seconds)
            .await?;

        let mut summary = WorkerCycleSummary {
            claimed_jobs: u32::try_from(claimed_jobs.len()).unwrap_or(u32::MAX),
            ..WorkerCycleSummary::default()
        };

        for claimed in claimed_jobs {
            let job_id = claimed.job_id;
            let attempt = claimed.attempt;
            let max_attempts = claimed.max_attempts;
            match self.execute_claimed_job(worker_id, claimed).await {
                Ok(_) => summary.executed_jobs = summary.executed_jobs.saturating_add(1),
                Err(error) => {
                    summary.failed_jobs = summary.failed_jobs.saturating_add(1);
                    summary.failures.push(DeletionJobFailure {
                        job_id,
                        attempt,
                        max_attempts,
                        error: error.to_string(),
                    });
                }
            }
        }

        Ok(summary)
    }
}
