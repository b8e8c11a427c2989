use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use proptest::prelude::*;
use tokio::sync::Mutex;

use guestbook_core::{AppError, AppResult};
use guestbook_domain::{
    Comment, CommentId, DeletionJob, DeletionJobId, EmailAddress, NewComment, RetentionMinutes,
};

use crate::comment_ports::CommentRepository;
use crate::purge_ports::{DeletionJobDispatcher, JobHandle};

use super::{PurgeResponseShape, PurgeService, parse_is_cron_flag};

#[derive(Default)]
struct RecordingDispatcher {
    jobs: Mutex<Vec<DeletionJob>>,
    reject: bool,
}

#[async_trait]
impl DeletionJobDispatcher for RecordingDispatcher {
    async fn enqueue_deletion(&self, job: DeletionJob) -> AppResult<JobHandle> {
        if self.reject {
            return Err(AppError::Dispatch("queue is full".to_owned()));
        }

        self.jobs.lock().await.push(job);
        Ok(JobHandle {
            job_id: DeletionJobId::new(),
            enqueued_at: Utc::now(),
        })
    }
}

#[derive(Default)]
struct FakeCommentRepository {
    comments: Mutex<Vec<Comment>>,
    fail_deletes: AtomicBool,
}

impl FakeCommentRepository {
    async fn seed_aged(&self, now: DateTime<Utc>, text: &str, age_minutes: i64) {
        let comment = NewComment::new("guest@example.com", text)
            .unwrap_or_else(|_| unreachable!())
            .into_comment(CommentId::new(), now - TimeDelta::minutes(age_minutes));
        self.comments.lock().await.push(comment);
    }

    async fn remaining_texts(&self) -> Vec<String> {
        self.comments
            .lock()
            .await
            .iter()
            .map(|comment| comment.text().to_owned())
            .collect()
    }
}

#[async_trait]
impl CommentRepository for FakeCommentRepository {
    async fn create_comment(&self, comment: NewComment) -> AppResult<Comment> {
        let comment = comment.into_comment(CommentId::new(), Utc::now());
        self.comments.lock().await.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self) -> AppResult<Vec<Comment>> {
        Ok(self.comments.lock().await.clone())
    }

    async fn list_comments_by_author(
        &self,
        author_email: &EmailAddress,
    ) -> AppResult<Vec<Comment>> {
        Ok(self
            .comments
            .lock()
            .await
            .iter()
            .filter(|comment| comment.author_email() == author_email)
            .cloned()
            .collect())
    }

    async fn delete_comments_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Internal("connection reset".to_owned()));
        }

        let mut comments = self.comments.lock().await;
        let before = comments.len();
        comments.retain(|comment| comment.created_at() >= cutoff);
        Ok((before - comments.len()) as u64)
    }
}

fn retention(minutes: i64) -> RetentionMinutes {
    RetentionMinutes::new(minutes).unwrap_or_else(|_| unreachable!())
}

fn build_service(
    dispatcher: Arc<RecordingDispatcher>,
    repository: Arc<FakeCommentRepository>,
    default_minutes: i64,
) -> PurgeService {
    PurgeService::new(dispatcher, repository, retention(default_minutes))
}

#[tokio::test]
async fn manual_trigger_without_retention_uses_default_and_redirects() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = build_service(
        dispatcher.clone(),
        Arc::new(FakeCommentRepository::default()),
        60,
    );

    let triggered = service.trigger_purge(None, None).await;
    assert!(triggered.is_ok());
    let triggered = triggered.unwrap_or_else(|_| unreachable!());

    assert_eq!(triggered.response_shape, PurgeResponseShape::Redirect);
    assert_eq!(
        *dispatcher.jobs.lock().await,
        vec![DeletionJob::new(retention(60), false)]
    );
}

#[tokio::test]
async fn cron_trigger_with_retention_renders_neutral_ok() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = build_service(
        dispatcher.clone(),
        Arc::new(FakeCommentRepository::default()),
        60,
    );

    let triggered = service.trigger_purge(Some("30"), Some("true")).await;
    assert!(triggered.is_ok());
    let triggered = triggered.unwrap_or_else(|_| unreachable!());

    assert_eq!(triggered.response_shape, PurgeResponseShape::NeutralOk);
    assert_eq!(triggered.job.retention_minutes().get(), 30);
    assert_eq!(
        *dispatcher.jobs.lock().await,
        vec![DeletionJob::new(retention(30), true)]
    );
}

#[tokio::test]
async fn empty_retention_parameter_falls_back_to_default() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = build_service(
        dispatcher.clone(),
        Arc::new(FakeCommentRepository::default()),
        45,
    );

    let triggered = service.trigger_purge(Some(""), Some("true")).await;
    assert!(triggered.is_ok());
    assert_eq!(
        dispatcher.jobs.lock().await.first().map(|job| job.retention_minutes().get()),
        Some(45)
    );
}

#[tokio::test]
async fn invalid_retention_is_rejected_before_enqueue() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = build_service(
        dispatcher.clone(),
        Arc::new(FakeCommentRepository::default()),
        60,
    );

    for raw in ["0", "-10", "ten", "1.5"] {
        let result = service.trigger_purge(Some(raw), None).await;
        assert!(
            matches!(result, Err(AppError::Validation(_))),
            "retention '{raw}' should be rejected"
        );
    }

    let result = service.trigger_purge(Some("10"), Some("maybe")).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(dispatcher.jobs.lock().await.is_empty());
}

#[tokio::test]
async fn dispatch_failure_is_surfaced_to_trigger_caller() {
    let dispatcher = Arc::new(RecordingDispatcher {
        reject: true,
        ..RecordingDispatcher::default()
    });
    let service = build_service(dispatcher, Arc::new(FakeCommentRepository::default()), 60);

    let result = service.trigger_purge(None, Some("true")).await;
    assert!(matches!(result, Err(AppError::Dispatch(_))));
}

#[tokio::test]
async fn trigger_does_not_delete_anything_inline() {
    let now = Utc::now();
    let repository = Arc::new(FakeCommentRepository::default());
    repository.seed_aged(now, "ancient", 10_000).await;
    let service = build_service(
        Arc::new(RecordingDispatcher::default()),
        repository.clone(),
        60,
    );

    let triggered = service.trigger_purge(Some("1"), None).await;
    assert!(triggered.is_ok());
    assert_eq!(repository.remaining_texts().await, vec!["ancient".to_owned()]);
}

#[tokio::test]
async fn default_purge_keeps_only_comments_inside_window() {
    let now = Utc::now();
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let repository = Arc::new(FakeCommentRepository::default());
    repository.seed_aged(now, "ten", 10).await;
    repository.seed_aged(now, "seventy", 70).await;
    repository.seed_aged(now, "one-twenty", 120).await;
    let service = build_service(dispatcher.clone(), repository.clone(), 60);

    let triggered = service.trigger_purge(None, Some("false")).await;
    assert!(triggered.is_ok());
    assert_eq!(
        triggered.unwrap_or_else(|_| unreachable!()).response_shape,
        PurgeResponseShape::Redirect
    );

    let job = dispatcher.jobs.lock().await.first().copied();
    assert!(job.is_some());
    let job = job.unwrap_or_else(|| unreachable!());
    let retention = job.retention_minutes().to_string();
    let is_cron = job.is_cron().to_string();

    let acknowledgement = service
        .handle_deletion_task(Some(retention.as_str()), Some(is_cron.as_str()))
        .await;
    assert!(acknowledgement.is_ok());
    assert_eq!(
        acknowledgement
            .unwrap_or_else(|_| unreachable!())
            .deleted_comments,
        2
    );
    assert_eq!(repository.remaining_texts().await, vec!["ten".to_owned()]);
}

#[tokio::test]
async fn deletion_task_is_idempotent() {
    let now = Utc::now();
    let repository = Arc::new(FakeCommentRepository::default());
    repository.seed_aged(now, "fresh", 5).await;
    repository.seed_aged(now, "stale", 500).await;
    let service = build_service(
        Arc::new(RecordingDispatcher::default()),
        repository.clone(),
        60,
    );
    let job = DeletionJob::new(retention(60), true);

    let first = service.execute_deletion(job, now).await;
    assert!(first.is_ok());
    let after_first = repository.remaining_texts().await;

    let second = service.execute_deletion(job, now).await;
    assert!(second.is_ok());
    assert_eq!(
        second.unwrap_or_else(|_| unreachable!()).deleted_comments,
        0
    );
    assert_eq!(repository.remaining_texts().await, after_first);
    assert_eq!(after_first, vec!["fresh".to_owned()]);
}

#[tokio::test]
async fn deletion_task_acknowledges_when_nothing_to_delete() {
    let service = build_service(
        Arc::new(RecordingDispatcher::default()),
        Arc::new(FakeCommentRepository::default()),
        60,
    );

    let acknowledgement = service.handle_deletion_task(None, None).await;
    assert!(acknowledgement.is_ok());
    let acknowledgement = acknowledgement.unwrap_or_else(|_| unreachable!());
    assert_eq!(acknowledgement.deleted_comments, 0);
    assert!(
        acknowledgement
            .message()
            .starts_with("Old comments have been removed")
    );
}

#[tokio::test]
async fn store_failure_surfaces_as_deletion_error() {
    let repository = Arc::new(FakeCommentRepository::default());
    repository.fail_deletes.store(true, Ordering::SeqCst);
    let service = build_service(Arc::new(RecordingDispatcher::default()), repository, 60);

    let result = service.handle_deletion_task(Some("5"), Some("true")).await;
    assert!(matches!(result, Err(AppError::DeletionExecution(_))));
}

#[test]
fn is_cron_flag_accepts_common_boolean_spellings() {
    assert!(matches!(parse_is_cron_flag(None), Ok(false)));
    assert!(matches!(parse_is_cron_flag(Some("")), Ok(false)));
    assert!(matches!(parse_is_cron_flag(Some("TRUE")), Ok(true)));
    assert!(matches!(parse_is_cron_flag(Some("0")), Ok(false)));
    assert!(parse_is_cron_flag(Some("cron")).is_err());
}

proptest! {
    #[test]
    fn cron_callers_never_get_redirects(is_cron in any::<bool>()) {
        let shape = PurgeResponseShape::for_caller(is_cron);
        prop_assert_eq!(shape == PurgeResponseShape::Redirect, !is_cron);
    }

    #[test]
    fn supplied_positive_retention_is_dispatched_verbatim(minutes in 1_u32..=u32::MAX) {
        let service = build_service(
            Arc::new(RecordingDispatcher::default()),
            Arc::new(FakeCommentRepository::default()),
            60,
        );
        let raw = minutes.to_string();
        let job = service.resolve_job(Some(raw.as_str()), Some("true"));
        prop_assert!(job.is_ok());
        prop_assert_eq!(
            job.unwrap_or_else(|_| unreachable!()).retention_minutes().get(),
            minutes
        );
    }
}
