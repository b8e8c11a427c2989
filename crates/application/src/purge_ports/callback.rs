use async_trait::async_trait;
use guestbook_core::AppResult;
use guestbook_domain::DeletionJob;

/// Port that delivers a claimed deletion job to the deletion task endpoint.
#[async_trait]
pub trait DeletionTaskCallback: Send + Sync {
    /// Invokes the deletion task with the job parameters and returns the
    /// endpoint acknowledgement. Any non-success outcome is an error.
    async fn invoke_deletion_task(&self, job: DeletionJob) -> AppResult<String>;
}
