//! Guestbook deletion worker runtime.

#![forbid(unsafe_code)]

mod http_client;
mod purge_scheduler;
mod worker_config;

use std::sync::Arc;

use guestbook_application::DeletionQueueService;
use guestbook_core::{AppError, AppResult};
use guestbook_infrastructure::{HttpDeletionTaskCallback, PostgresDeletionJobQueue};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::http_client::build_http_client;
use crate::purge_scheduler::{PurgeScheduler, spawn_purge_scheduler};
use crate::worker_config::{WorkerConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let http_client = build_http_client()?;

    let queue = Arc::new(PostgresDeletionJobQueue::new(pool, config.max_attempts));
    let callback = Arc::new(HttpDeletionTaskCallback::new(
        http_client.clone(),
        config.api_base_url.as_str(),
    )?);
    let queue_service =
        DeletionQueueService::new(queue, callback, config.retry_backoff_seconds);

    if let Some(interval) = config.purge_schedule_interval {
        spawn_purge_scheduler(PurgeScheduler::new(
            http_client,
            config.api_base_url.as_str(),
            interval,
        ));
    }

    info!(
        worker_id = %config.worker_id,
        api_base_url = %config.api_base_url,
        claim_limit = config.claim_limit,
        lease_seconds = config.lease_seconds,
        poll_interval_ms = config.poll_interval_ms,
        max_attempts = config.max_attempts,
        "guestbook-worker started"
    );

    loop {
        match queue_service
            .run_worker_cycle(
                config.worker_id.as_str(),
                config.claim_limit,
                config.lease_seconds,
            )
            .await
        {
            Ok(summary) => {
                for failure in &summary.failures {
                    warn!(
                        worker_id = %config.worker_id,
                        job_id = %failure.job_id,
                        attempt = failure.attempt,
                        max_attempts = failure.max_attempts,
                        dead_lettered = failure.is_final_attempt(),
                        error = %failure.error,
                        "deletion job execution failed"
                    );
                }

                if summary.claimed_jobs == 0 {
                    tokio::time::sleep(config.poll_interval()).await;
                    continue;
                }

                info!(
                    worker_id = %config.worker_id,
                    claimed_jobs = summary.claimed_jobs,
                    executed_jobs = summary.executed_jobs,
                    failed_jobs = summary.failed_jobs,
                    "deletion jobs processed"
                );
            }
            Err(error) => {
                warn!(
                    worker_id = %config.worker_id,
                    error = %error,
                    "failed to claim deletion jobs"
                );
                tokio::time::sleep(config.poll_interval()).await;
            }
        }
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}
