//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod filesystem_attachment_resolver;
mod http_deletion_task_callback;
mod in_memory_comment_repository;
mod in_memory_deletion_job_queue;
mod postgres_comment_repository;
mod postgres_deletion_job_queue;

pub use filesystem_attachment_resolver::FilesystemAttachmentResolver;
pub use http_deletion_task_callback::{DELETION_TASK_PATH, HttpDeletionTaskCallback};
pub use in_memory_comment_repository::InMemoryCommentRepository;
pub use in_memory_deletion_job_queue::{
    FINISHED_JOB_HISTORY_LIMIT, InMemoryDeletionJobQueue, QueuedDeletionJobStatus,
};
pub use postgres_comment_repository::PostgresCommentRepository;
pub use postgres_deletion_job_queue::PostgresDeletionJobQueue;
