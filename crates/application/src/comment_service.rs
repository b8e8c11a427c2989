use std::sync::Arc;

use guestbook_core::{AppError, AppResult};
use guestbook_domain::{Comment, EmailAddress, NewComment};

use crate::comment_ports::{AttachmentResolver, CommentRepository, ImageUpload};

/// Comment submission as received from the guestbook form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCommentInput {
    /// Commenter email.
    pub author_email: String,
    /// Comment body.
    pub text: String,
    /// Optional image upload.
    pub image: Option<ImageUpload>,
}

/// Guestbook listing and submission service.
#[derive(Clone)]
pub struct CommentService {
    repository: Arc<dyn CommentRepository>,
    attachment_resolver: Arc<dyn AttachmentResolver>,
}

impl CommentService {
    /// Creates a comment service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn CommentRepository>,
        attachment_resolver: Arc<dyn AttachmentResolver>,
    ) -> Self {
        Self {
            repository,
            attachment_resolver,
        }
    }

    /// Lists every comment, newest first.
    pub async fn list_comments(&self) -> AppResult<Vec<Comment>> {
        self.repository.list_comments().await
    }

    /// Lists comments for one author email.
    pub async fn list_comments_for_author(
        &self,
        author_email: Option<&str>,
    ) -> AppResult<Vec<Comment>> {
        let author_email = author_email
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::Validation("userEmail is required".to_owned()))?;
        let author_email = EmailAddress::new(author_email)?;

        self.repository.list_comments_by_author(&author_email).await
    }

    /// Validates and stores one comment.
    ///
    /// The comment text and author are validated before the image is stored,
    /// and an image that fails to resolve aborts the whole submission. When
    /// the comment itself cannot be stored, its freshly stored image is
    /// discarded again.
    pub async fn add_comment(&self, input: SubmitCommentInput) -> AppResult<Comment> {
        let mut comment = NewComment::new(input.author_email, input.text)?;
        let mut stored_attachment = None;

        if let Some(upload) = input.image.filter(|upload| !upload.is_empty()) {
            let attachment = self.attachment_resolver.resolve_attachment(upload).await?;
            comment = comment.with_attachment(attachment.clone());
            stored_attachment = Some(attachment);
        }

        let error = match self.repository.create_comment(comment).await {
            Ok(created) => return Ok(created),
            Err(error) => error,
        };

        let Some(attachment) = stored_attachment else {
            return Err(error);
        };

        match self
            .attachment_resolver
            .discard_attachment(&attachment)
            .await
        {
            Ok(()) => Err(error),
            Err(cleanup_error) => Err(AppError::Internal(format!(
                "failed to store comment: {error}; additionally failed to discard image '{}': {cleanup_error}",
                attachment.storage_key()
            ))),
        }
    }
}

#[cfg(test)]
mod tests;
