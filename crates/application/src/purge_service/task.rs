use super::*;

impl PurgeService {
    /// Executes one deletion task: removes every comment older than the
    /// retention window measured from now.
    ///
    /// Running it again with the same parameters is a no-op for comments that
    /// are already gone.
    pub async fn handle_deletion_task(
        &self,
        retention_minutes: Option<&str>,
        is_cron: Option<&str>,
    ) -> AppResult<DeletionAcknowledgement> {
        let job = self.resolve_job(retention_minutes, is_cron)?;
        self.execute_job(job).await
    }

    /// Executes an already resolved deletion job against the current time.
    pub async fn execute_job(&self, job: DeletionJob) -> AppResult<DeletionAcknowledgement> {
        self.execute_deletion(job, Utc::now()).await
    }

    pub(super) async fn execute_deletion(
        &self,
        job: DeletionJob,
        now: DateTime<Utc>,
    ) -> AppResult<DeletionAcknowledgement> {
        let cutoff = job.retention_minutes().cutoff_from(now);
        let deleted_comments = self
            .repository
            .delete_comments_created_before(cutoff)
            .await
            .map_err(|error| match error {
                AppError::DeletionExecution(message) => AppError::DeletionExecution(message),
                other => AppError::DeletionExecution(format!(
                    "failed to delete comments created before {cutoff}: {other}"
                )),
            })?;

        Ok(DeletionAcknowledgement {
            job,
            cutoff,
            deleted_comments,
        })
    }
}
