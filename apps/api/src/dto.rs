use guestbook_domain::Comment;
use serde::{Deserialize, Serialize};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Template representation of a stored comment.
#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: String,
    pub author_email: String,
    pub text: String,
    pub created_at: String,
    pub image_url: Option<String>,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id().to_string(),
            author_email: comment.author_email().as_str().to_owned(),
            text: comment.text().to_owned(),
            created_at: comment.created_at().to_rfc3339(),
            image_url: comment.image_url().map(ToOwned::to_owned),
        }
    }
}

/// Query parameters for the per-author listing.
#[derive(Debug, Default, Deserialize)]
pub struct CommentsForUserQuery {
    #[serde(rename = "userEmail", alias = "authorEmail")]
    pub user_email: Option<String>,
}

/// Purge parameters, accepted as query string on the trigger and as query or
/// form body on the task endpoint.
///
/// Values stay raw strings so that an empty or malformed value reaches the
/// purge service, which owns the fallback and validation rules.
#[derive(Debug, Default, Deserialize)]
pub struct PurgeParams {
    #[serde(rename = "retentionInMinutes", alias = "retentionMinutes")]
    pub retention_in_minutes: Option<String>,
    #[serde(rename = "isCron")]
    pub is_cron: Option<String>,
}

impl PurgeParams {
    /// Fills fields missing here from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            retention_in_minutes: self.retention_in_minutes.or(fallback.retention_in_minutes),
            is_cron: self.is_cron.or(fallback.is_cron),
        }
    }
}
