use async_trait::async_trait;
use guestbook_application::DeletionTaskCallback;
use guestbook_core::{AppError, AppResult};
use guestbook_domain::DeletionJob;
use url::Url;

/// Path of the deletion task endpoint on the guestbook API.
pub const DELETION_TASK_PATH: &str = "removeOldCommentsTaskHandler";

/// Delivers deletion jobs to the API's task endpoint over HTTP.
pub struct HttpDeletionTaskCallback {
    http_client: reqwest::Client,
    task_url: Url,
}

impl HttpDeletionTaskCallback {
    /// Creates a callback targeting the API at `api_base_url`.
    pub fn new(http_client: reqwest::Client, api_base_url: &str) -> AppResult<Self> {
        let mut base_url = Url::parse(api_base_url).map_err(|error| {
            AppError::Validation(format!("invalid api base url '{api_base_url}': {error}"))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(path.as_str());
        }
        let task_url = base_url.join(DELETION_TASK_PATH).map_err(|error| {
            AppError::Validation(format!(
                "failed to build deletion task url from '{api_base_url}': {error}"
            ))
        })?;

        Ok(Self {
            http_client,
            task_url,
        })
    }

    /// Returns the resolved task endpoint.
    #[must_use]
    pub fn task_url(&self) -> &Url {
        &self.task_url
    }
}

#[async_trait]
impl DeletionTaskCallback for HttpDeletionTaskCallback {
    async fn invoke_deletion_task(&self, job: DeletionJob) -> AppResult<String> {
        let retention_minutes = job.retention_minutes().to_string();
        let is_cron = job.is_cron().to_string();

        let response = self
            .http_client
            .post(self.task_url.clone())
            .form(&[
                ("retentionInMinutes", retention_minutes.as_str()),
                ("isCron", is_cron.as_str()),
            ])
            .send()
            .await
            .map_err(|error| {
                AppError::DeletionExecution(format!(
                    "deletion task transport error for '{}': {error}",
                    self.task_url
                ))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response body unavailable>".to_owned());

        if !status.is_success() {
            return Err(AppError::DeletionExecution(format!(
                "deletion task failed with status {status}: {body}"
            )));
        }

        Ok(body)
    }
}
