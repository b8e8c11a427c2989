use std::time::Duration;

use guestbook_core::{AppError, AppResult};
use reqwest::StatusCode;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Periodically triggers a cron purge on the API, standing in for an
/// external scheduler.
pub struct PurgeScheduler {
    http_client: reqwest::Client,
    trigger_url: String,
    interval: Duration,
}

impl PurgeScheduler {
    pub fn new(http_client: reqwest::Client, api_base_url: &str, interval: Duration) -> Self {
        Self {
            http_client,
            trigger_url: trigger_url(api_base_url),
            interval,
        }
    }

    /// Sends a single cron trigger. Only a 2xx answer counts as accepted.
    pub async fn trigger_once(&self) -> AppResult<StatusCode> {
        let response = self
            .http_client
            .get(self.trigger_url.as_str())
            .query(&[("isCron", "true")])
            .send()
            .await
            .map_err(|error| {
                AppError::Dispatch(format!(
                    "failed to reach purge trigger '{}': {error}",
                    self.trigger_url
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Dispatch(format!(
                "purge trigger '{}' answered with status {status}",
                self.trigger_url
            )));
        }

        Ok(status)
    }

    async fn run(self) {
        info!(
            trigger_url = %self.trigger_url,
            interval = ?self.interval,
            "purge scheduler started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match self.trigger_once().await {
                Ok(status) => info!(status = %status, "scheduled purge triggered"),
                Err(error) => warn!(error = %error, "scheduled purge trigger failed"),
            }
        }
    }
}

pub fn spawn_purge_scheduler(scheduler: PurgeScheduler) -> JoinHandle<()> {
    tokio::spawn(scheduler.run())
}

fn trigger_url(api_base_url: &str) -> String {
    format!("{}/removeOldComments", api_base_url.trim_end_matches('/'))
}
