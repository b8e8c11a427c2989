use std::sync::Arc;

use chrono::{DateTime, Utc};
use guestbook_core::{AppError, AppResult};
use guestbook_domain::{DeletionJob, RetentionMinutes};

use crate::comment_ports::CommentRepository;
use crate::purge_ports::{DeletionJobDispatcher, JobHandle};

mod task;
mod trigger;

/// Response shape owed to the caller of a purge trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeResponseShape {
    /// Interactive caller: send them back to the comment listing.
    Redirect,
    /// Scheduler caller: plain success status, no redirect.
    NeutralOk,
}

impl PurgeResponseShape {
    /// Picks the response shape for a caller.
    ///
    /// Schedulers only count 2xx as a successful run and do not follow
    /// redirects, so cron callers never get one.
    #[must_use]
    pub fn for_caller(is_cron: bool) -> Self {
        if is_cron {
            Self::NeutralOk
        } else {
            Self::Redirect
        }
    }
}

/// Result of a successfully enqueued purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeTriggered {
    /// Job parameters as dispatched.
    pub job: DeletionJob,
    /// Dispatcher receipt.
    pub handle: JobHandle,
    /// Response shape for the triggering caller.
    pub response_shape: PurgeResponseShape,
}

/// Outcome of one executed deletion task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionAcknowledgement {
    /// Job parameters that were applied.
    pub job: DeletionJob,
    /// Comments created before this instant were deleted.
    pub cutoff: DateTime<Utc>,
    /// Number of comments removed by this run.
    pub deleted_comments: u64,
}

impl DeletionAcknowledgement {
    /// Returns the plain-text acknowledgement for the job runner.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Old comments have been removed\ndeleted={} retention_minutes={} is_cron={}",
            self.deleted_comments,
            self.job.retention_minutes(),
            self.job.is_cron()
        )
    }
}

/// Retention-driven purge service.
///
/// Triggering a purge only enqueues a deletion job; the deletion itself runs
/// later when the job reaches [`PurgeService::handle_deletion_task`].
#[derive(Clone)]
pub struct PurgeService {
    dispatcher: Arc<dyn DeletionJobDispatcher>,
    repository: Arc<dyn CommentRepository>,
    default_retention: RetentionMinutes,
}

impl PurgeService {
    /// Creates a purge service with the process-wide default retention window.
    #[must_use]
    pub fn new(
        dispatcher: Arc<dyn DeletionJobDispatcher>,
        repository: Arc<dyn CommentRepository>,
        default_retention: RetentionMinutes,
    ) -> Self {
        Self {
            dispatcher,
            repository,
            default_retention,
        }
    }

    /// Resolves raw request parameters into a deletion job.
    ///
    /// A missing or empty retention value falls back to the configured
    /// default; a present but invalid one is rejected.
    pub fn resolve_job(
        &self,
        retention_minutes: Option<&str>,
        is_cron: Option<&str>,
    ) -> AppResult<DeletionJob> {
        let retention_minutes = match retention_minutes.map(str::trim) {
            None | Some("") => self.default_retention,
            Some(value) => RetentionMinutes::parse(value)?,
        };
        let is_cron = parse_is_cron_flag(is_cron)?;

        Ok(DeletionJob::new(retention_minutes, is_cron))
    }
}

/// Parses the optional `isCron` request flag, defaulting to `false`.
pub fn parse_is_cron_flag(value: Option<&str>) -> AppResult<bool> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(false);
    };

    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "isCron must be a boolean, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests;
