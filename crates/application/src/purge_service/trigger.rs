use super::*;

impl PurgeService {
    /// Validates purge parameters, enqueues a deletion job and returns
    /// without waiting for it to run.
    pub async fn trigger_purge(
        &self,
        retention_minutes: Option<&str>,
        is_cron: Option<&str>,
    ) -> AppResult<PurgeTriggered> {
        let job = self.resolve_job(retention_minutes, is_cron)?;
        let handle = self.dispatcher.enqueue_deletion(job).await?;

        Ok(PurgeTriggered {
            job,
            handle,
            response_shape: PurgeResponseShape::for_caller(job.is_cron()),
        })
    }
}
