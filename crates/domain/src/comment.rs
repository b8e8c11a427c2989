//! Guestbook comment types and validation rules.

use chrono::{DateTime, Utc};
use guestbook_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted comment body length, in characters.
pub const COMMENT_TEXT_MAX_LENGTH: usize = 2000;

/// Unique identifier for a stored comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(Uuid);

impl CommentId {
    /// Creates a new random comment identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a comment identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CommentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated email address identifying a commenter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    /// The stored value is trimmed and lowercased so author lookups are
    /// case-insensitive.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "author email must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "author email must contain exactly one '@'".to_owned(),
            ));
        };

        if domain.contains('@') {
            return Err(AppError::Validation(
                "author email must contain exactly one '@'".to_owned(),
            ));
        }

        if local.is_empty() {
            return Err(AppError::Validation(
                "author email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "author email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "author email must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Image attached to a comment.
///
/// The servable URL and the storage key always travel together, so a comment
/// either has both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    url: NonEmptyString,
    storage_key: NonEmptyString,
}

impl ImageAttachment {
    /// Creates an attachment from a resolved URL and storage key.
    pub fn new(url: impl Into<String>, storage_key: impl Into<String>) -> AppResult<Self> {
        let url = NonEmptyString::new(url).map_err(|_| {
            AppError::Validation("image url must not be empty".to_owned())
        })?;
        let storage_key = NonEmptyString::new(storage_key).map_err(|_| {
            AppError::Validation("image storage key must not be empty".to_owned())
        })?;

        Ok(Self { url, storage_key })
    }

    /// Rebuilds an optional attachment from two independently stored columns.
    ///
    /// Returns an error when only one half of the pair is present.
    pub fn from_optional_parts(
        url: Option<String>,
        storage_key: Option<String>,
    ) -> AppResult<Option<Self>> {
        match (url, storage_key) {
            (None, None) => Ok(None),
            (Some(url), Some(storage_key)) => Self::new(url, storage_key).map(Some),
            _ => Err(AppError::Internal(
                "comment image url and storage key must be set together".to_owned(),
            )),
        }
    }

    /// Returns the publicly servable image URL.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns the storage system reference for the image.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        self.storage_key.as_str()
    }
}

/// Validated comment submission, before the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    author_email: EmailAddress,
    text: NonEmptyString,
    attachment: Option<ImageAttachment>,
}

impl NewComment {
    /// Validates a submission without an attachment.
    pub fn new(author_email: impl Into<String>, text: impl Into<String>) -> AppResult<Self> {
        let author_email = EmailAddress::new(author_email)?;
        let text = text.into();
        let text = NonEmptyString::new(text.trim())
            .map_err(|_| AppError::Validation("comment text must not be empty".to_owned()))?;

        if text.as_str().chars().count() > COMMENT_TEXT_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "comment text must not exceed {COMMENT_TEXT_MAX_LENGTH} characters"
            )));
        }

        Ok(Self {
            author_email,
            text,
            attachment: None,
        })
    }

    /// Attaches a resolved image.
    #[must_use]
    pub fn with_attachment(mut self, attachment: ImageAttachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Returns the commenter email.
    #[must_use]
    pub fn author_email(&self) -> &EmailAddress {
        &self.author_email
    }

    /// Returns the comment body.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Returns the attachment, if one was resolved.
    #[must_use]
    pub fn attachment(&self) -> Option<&ImageAttachment> {
        self.attachment.as_ref()
    }

    /// Completes the submission into a stored comment.
    #[must_use]
    pub fn into_comment(self, id: CommentId, created_at: DateTime<Utc>) -> Comment {
        Comment {
            id,
            author_email: self.author_email,
            text: self.text,
            created_at,
            attachment: self.attachment,
        }
    }
}

/// Persisted guestbook comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    id: CommentId,
    author_email: EmailAddress,
    text: NonEmptyString,
    created_at: DateTime<Utc>,
    attachment: Option<ImageAttachment>,
}

impl Comment {
    /// Rebuilds a comment from stored values.
    pub fn from_stored(
        id: CommentId,
        author_email: impl Into<String>,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
        attachment: Option<ImageAttachment>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            author_email: EmailAddress::new(author_email)?,
            text: NonEmptyString::new(text)?,
            created_at,
            attachment,
        })
    }

    /// Returns the comment identifier.
    #[must_use]
    pub fn id(&self) -> CommentId {
        self.id
    }

    /// Returns the commenter email.
    #[must_use]
    pub fn author_email(&self) -> &EmailAddress {
        &self.author_email
    }

    /// Returns the comment body.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Returns the creation timestamp assigned by the store.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the image attachment, if any.
    #[must_use]
    pub fn attachment(&self) -> Option<&ImageAttachment> {
        self.attachment.as_ref()
    }

    /// Returns the servable image URL, if any.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.attachment.as_ref().map(ImageAttachment::url)
    }

    /// Returns the image storage key, if any.
    #[must_use]
    pub fn image_key(&self) -> Option<&str> {
        self.attachment.as_ref().map(ImageAttachment::storage_key)
    }
}
