use std::sync::Arc;

use guestbook_application::{CommentService, DeletionJobDispatcher, PurgeService};
use guestbook_core::AppError;
use guestbook_infrastructure::{
    FilesystemAttachmentResolver, InMemoryDeletionJobQueue, PostgresCommentRepository,
    PostgresDeletionJobQueue,
};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::{ApiConfig, PurgeDispatchMode};
use crate::state::AppState;
use crate::views::Views;

use super::in_process_worker::InProcessWorker;

/// Wired application state plus the embedded worker, when one is configured.
pub struct AppServices {
    pub app_state: AppState,
    pub in_process_worker: Option<InProcessWorker>,
}

pub fn build_app_services(pool: PgPool, config: &ApiConfig) -> Result<AppServices, AppError> {
    let comment_repository = Arc::new(PostgresCommentRepository::new(pool.clone()));
    let attachment_resolver = Arc::new(FilesystemAttachmentResolver::new(
        config.image_storage_dir.clone(),
        config.public_base_url.as_str(),
        config.max_upload_bytes,
    )?);
    let comment_service = CommentService::new(comment_repository.clone(), attachment_resolver);

    let in_process_queue = match config.purge_dispatch_mode {
        PurgeDispatchMode::Queued => None,
        PurgeDispatchMode::InProcess => Some(Arc::new(InMemoryDeletionJobQueue::new(
            config.purge_job_max_attempts,
        ))),
    };
    let dispatcher: Arc<dyn DeletionJobDispatcher> = match &in_process_queue {
        Some(queue) => queue.clone(),
        None => Arc::new(PostgresDeletionJobQueue::new(
            pool,
            config.purge_job_max_attempts,
        )),
    };

    let purge_service = PurgeService::new(
        dispatcher,
        comment_repository,
        config.default_retention,
    );
    let in_process_worker = in_process_queue.map(|queue| {
        InProcessWorker::new(
            queue,
            purge_service.clone(),
            config.in_process_worker_poll_interval_ms,
        )
    });

    info!(
        default_retention_minutes = config.default_retention.get(),
        dispatch_mode = ?config.purge_dispatch_mode,
        image_storage_dir = %config.image_storage_dir.display(),
        "guestbook services configured"
    );

    Ok(AppServices {
        app_state: AppState {
            comment_service,
            purge_service,
            views: Arc::new(Views::load()?),
        },
        in_process_worker,
    })
}
