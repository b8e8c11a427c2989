//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod comment;
mod deletion_job;
mod retention;

pub use comment::{
    COMMENT_TEXT_MAX_LENGTH, Comment, CommentId, EmailAddress, ImageAttachment, NewComment,
};
pub use deletion_job::{DeletionJob, DeletionJobId};
pub use retention::RetentionMinutes;
