use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guestbook_core::AppResult;
use guestbook_domain::{Comment, EmailAddress, NewComment};

/// Repository port for guestbook comments.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Stores one comment, assigning its identifier and creation timestamp.
    async fn create_comment(&self, comment: NewComment) -> AppResult<Comment>;

    /// Lists every comment, newest first.
    async fn list_comments(&self) -> AppResult<Vec<Comment>>;

    /// Lists comments posted by one author, newest first.
    async fn list_comments_by_author(&self, author_email: &EmailAddress)
    -> AppResult<Vec<Comment>>;

    /// Deletes every comment created strictly before `cutoff` and returns how
    /// many were removed. Deleting nothing is not an error.
    async fn delete_comments_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}
