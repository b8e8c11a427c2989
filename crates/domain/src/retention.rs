//! Comment retention window.

use chrono::{DateTime, TimeDelta, Utc};
use guestbook_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Positive age threshold, in minutes, beyond which a comment may be purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct RetentionMinutes(u32);

impl RetentionMinutes {
    /// Creates a validated retention window.
    ///
    /// Zero and negative values are rejected rather than clamped.
    pub fn new(minutes: i64) -> AppResult<Self> {
        if minutes <= 0 {
            return Err(AppError::Validation(format!(
                "retention minutes must be a positive integer, got {minutes}"
            )));
        }

        u32::try_from(minutes).map(Self).map_err(|_| {
            AppError::Validation(format!(
                "retention minutes must not exceed {}, got {minutes}",
                u32::MAX
            ))
        })
    }

    /// Parses a retention window from a raw request parameter.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        let minutes = trimmed.parse::<i64>().map_err(|error| {
            AppError::Validation(format!(
                "retention minutes must be a positive integer, got '{trimmed}': {error}"
            ))
        })?;

        Self::new(minutes)
    }

    /// Returns the window length in minutes.
    #[must_use]
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Returns the instant before which comments fall outside the window.
    #[must_use]
    pub fn cutoff_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(TimeDelta::minutes(i64::from(self.0)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Returns true when a comment created at `created_at` is strictly older
    /// than the window measured from `now`.
    #[must_use]
    pub fn is_expired(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        created_at < self.cutoff_from(now)
    }
}

impl TryFrom<i64> for RetentionMinutes {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RetentionMinutes> for u32 {
    fn from(value: RetentionMinutes) -> Self {
        value.0
    }
}

impl std::fmt::Display for RetentionMinutes {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
