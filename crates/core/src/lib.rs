//! Shared primitives for all Rust crates in the guestbook.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across guestbook crates.
pub type AppResult<T> = Result<T, AppError>;

/// Text that holds at least one non-whitespace character.
///
/// Deserialization runs the same check as [`NonEmptyString::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Wraps `value` unless it is empty or whitespace only.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the wrapped text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = AppError;

    fn try_from(value: String) -> AppResult<Self> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant, rejected before any side effect.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An uploaded image could not be turned into a servable attachment.
    #[error("attachment error: {0}")]
    Attachment(String),

    /// The deferred job dispatcher refused or failed to accept a job.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// Bulk deletion failed while executing a deletion task.
    #[error("deletion error: {0}")]
    DeletionExecution(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
