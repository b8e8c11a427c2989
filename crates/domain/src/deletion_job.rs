use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RetentionMinutes;

/// Identifier assigned to a deletion job when the dispatcher accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeletionJobId(Uuid);

impl DeletionJobId {
    /// Creates a random job identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a job identifier from an existing UUID value.
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

impl Default for DeletionJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeletionJobId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Deferred request to purge comments older than a retention window.
///
/// `is_cron` records who asked for the purge. It is carried to the task
/// callback for logging only and never changes what gets deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionJob {
    retention_minutes: RetentionMinutes,
    is_cron: bool,
}

impl DeletionJob {
    /// Creates a deletion job message.
    #[must_use]
    pub fn new(retention_minutes: RetentionMinutes, is_cron: bool) -> Self {
        Self {
            retention_minutes,
            is_cron,
        }
    }

    /// Returns the retention window the task will apply.
    #[must_use]
    pub fn retention_minutes(&self) -> RetentionMinutes {
        self.retention_minutes
    }

    /// Returns whether a scheduler requested the purge.
    #[must_use]
    pub fn is_cron(&self) -> bool {
        self.is_cron
    }
}
