//! Application services and ports.

#![forbid(unsafe_code)]

mod comment_ports;
mod comment_service;
mod deletion_queue_service;
mod purge_ports;
mod purge_service;

pub use comment_ports::{AttachmentResolver, CommentRepository, ImageUpload};
pub use comment_service::{CommentService, SubmitCommentInput};
pub use deletion_queue_service::{DeletionJobFailure, DeletionQueueService, WorkerCycleSummary};
pub use purge_ports::{
    ClaimedDeletionJob, DeletionJobDispatcher, DeletionJobFailureOutcome, DeletionJobQueue,
    DeletionTaskCallback, JobHandle,
};
pub use purge_service::{
    DeletionAcknowledgement, PurgeResponseShape, PurgeService, PurgeTriggered,
    parse_is_cron_flag,
};
