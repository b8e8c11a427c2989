use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use guestbook_application::{
    DeletionJobQueue, DeletionQueueService, DeletionTaskCallback, PurgeService,
    WorkerCycleSummary,
};
use guestbook_core::AppResult;
use guestbook_domain::DeletionJob;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const CLAIM_LIMIT: usize = 10;
const LEASE_SECONDS: u32 = 60;
const RETRY_BACKOFF_SECONDS: u32 = 5;

/// Runs deletion jobs through the purge service of the same process instead
/// of calling the task endpoint over HTTP.
struct LocalDeletionTaskCallback {
    purge_service: PurgeService,
}

#[async_trait]
impl DeletionTaskCallback for LocalDeletionTaskCallback {
    async fn invoke_deletion_task(&self, job: DeletionJob) -> AppResult<String> {
        let acknowledgement = self.purge_service.execute_job(job).await?;
        info!(
            deleted_comments = acknowledgement.deleted_comments,
            retention_minutes = job.retention_minutes().get(),
            is_cron = job.is_cron(),
            "old comments removed"
        );

        Ok(acknowledgement.message())
    }
}

/// Queue consumer embedded in the API for `in_process` dispatch mode.
pub struct InProcessWorker {
    queue_service: DeletionQueueService,
    worker_id: String,
    poll_interval: Duration,
}

impl InProcessWorker {
    pub fn new(
        queue: Arc<dyn DeletionJobQueue>,
        purge_service: PurgeService,
        poll_interval_ms: u64,
    ) -> Self {
        let callback = Arc::new(LocalDeletionTaskCallback { purge_service });

        Self {
            queue_service: DeletionQueueService::new(queue, callback, RETRY_BACKOFF_SECONDS),
            worker_id: format!("api-in-process-{}", std::process::id()),
            poll_interval: Duration::from_millis(poll_interval_ms),
        }
    }

    /// Claims and executes one batch of due jobs.
    pub async fn run_once(&self) -> AppResult<WorkerCycleSummary> {
        self.queue_service
            .run_worker_cycle(self.worker_id.as_str(), CLAIM_LIMIT, LEASE_SECONDS)
            .await
    }

    async fn run(self) {
        info!(
            worker_id = %self.worker_id,
            poll_interval = ?self.poll_interval,
            "in-process deletion worker started"
        );

        loop {
            match self.run_once().await {
                Ok(summary) => {
                    for failure in &summary.failures {
                        warn!(
                            worker_id = %self.worker_id,
                            job_id = %failure.job_id,
                            attempt = failure.attempt,
                            max_attempts = failure.max_attempts,
                            dead_lettered = failure.is_final_attempt(),
                            error = %failure.error,
                            "deletion job failed"
                        );
                    }
                    if summary.claimed_jobs > 0 {
                        info!(
                            worker_id = %self.worker_id,
                            claimed_jobs = summary.claimed_jobs,
                            executed_jobs = summary.executed_jobs,
                            failed_jobs = summary.failed_jobs,
                            "deletion worker cycle finished"
                        );
                        continue;
                    }
                }
                Err(error) => {
                    warn!(
                        worker_id = %self.worker_id,
                        error = %error,
                        "failed to claim deletion jobs"
                    );
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

pub fn spawn_in_process_worker(worker: InProcessWorker) -> JoinHandle<()> {
    tokio::spawn(worker.run())
}
