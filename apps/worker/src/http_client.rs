use std::time::Duration;

use guestbook_core::{AppError, AppResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client shared by the task callback and the purge scheduler.
///
/// Redirects are returned to the caller unfollowed, so a redirecting purge
/// trigger reads as a failed run.
pub fn build_http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))
}
