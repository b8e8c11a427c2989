use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guestbook_application::{
    ClaimedDeletionJob, DeletionJobDispatcher, DeletionJobFailureOutcome, DeletionJobQueue,
    JobHandle,
};
use guestbook_core::{AppError, AppResult};
use guestbook_domain::{DeletionJob, DeletionJobId, RetentionMinutes};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed deletion job queue.
///
/// Acts as the trigger-side dispatcher and as the worker-side queue, so the
/// API and worker processes share one durable table.
#[derive(Clone)]
pub struct PostgresDeletionJobQueue {
    pool: PgPool,
    max_attempts: u32,
}

impl PostgresDeletionJobQueue {
    /// Creates a queue adapter. Jobs enqueued through it are dead-lettered
    /// after `max_attempts` failed attempts.
    #[must_use]
    pub fn new(pool: PgPool, max_attempts: u32) -> Self {
        Self {
            pool,
            max_attempts: max_attempts.max(1),
        }
    }
}

#[derive(Debug, FromRow)]
struct EnqueuedJobRow {
    id: uuid::Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ClaimedJobRow {
    id: uuid::Uuid,
    retention_minutes: i64,
    is_cron: bool,
    attempts: i32,
    max_attempts: i32,
    lease_token: String,
}

#[derive(Debug, FromRow)]
struct FailedJobRow {
    status: String,
}

#[async_trait]
impl DeletionJobDispatcher for PostgresDeletionJobQueue {
    async fn enqueue_deletion(&self, job: DeletionJob) -> AppResult<JobHandle> {
        let max_attempts = i32::try_from(self.max_attempts).map_err(|error| {
            AppError::Dispatch(format!("invalid deletion job max_attempts: {error}"))
        })?;

        let row = sqlx::query_as::<_, EnqueuedJobRow>(
            r#"
            INSERT INTO comment_deletion_jobs (
                id,
                retention_minutes,
                is_cron,
                status,
                attempts,
                max_attempts,
                available_at,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, 'pending', 0, $4, now(), now(), now())
            RETURNING id, created_at
            "#,
        )
        .bind(DeletionJobId::new().as_uuid())
        .bind(i64::from(job.retention_minutes().get()))
        .bind(job.is_cron())
        .bind(max_attempts)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Dispatch(format!(
                "failed to enqueue deletion job with retention {} minutes: {error}",
                job.retention_minutes()
            ))
        })?;

        Ok(JobHandle {
            job_id: DeletionJobId::from_uuid(row.id),
            enqueued_at: row.created_at,
        })
    }
}

#[async_trait]
impl DeletionJobQueue for PostgresDeletionJobQueue {
    async fn claim_jobs(
        &self,
        worker_id: &str,
        limit: usize,
        lease_seconds: u32,
    ) -> AppResult<Vec<ClaimedDeletionJob>> {
        let limit = i64::try_from(limit).map_err(|error| {
            AppError::Validation(format!("invalid deletion job claim limit: {error}"))
        })?;
        let lease_seconds = i32::try_from(lease_seconds).map_err(|error| {
            AppError::Validation(format!("invalid deletion job lease_seconds: {error}"))
        })?;

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start deletion job claim transaction: {error}"
            ))
        })?;

        let dead_lettered = sqlx::query(
            r#"
            UPDATE comment_deletion_jobs
            SET
                status = 'dead_lettered',
                leased_by = NULL,
                lease_token = NULL,
                lease_expires_at = NULL,
                last_error = COALESCE(last_error, 'lease expired on final attempt'),
                updated_at = now()
            WHERE status = 'leased'
              AND lease_expires_at < now()
              AND attempts >= max_attempts
            "#,
        )
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to dead-letter expired deletion jobs: {error}"
            ))
        })?;

        if dead_lettered.rows_affected() > 0 {
            tracing::warn!(
                count = dead_lettered.rows_affected(),
                "dead-lettered deletion jobs whose final lease expired"
            );
        }

        let rows = sqlx::query_as::<_, ClaimedJobRow>(
            r#"
            WITH candidate_jobs AS (
                SELECT id
                FROM comment_deletion_jobs
                WHERE (
                        (status = 'pending' AND available_at <= now())
                        OR (status = 'leased' AND lease_expires_at < now())
                      )
                  AND attempts < max_attempts
                ORDER BY available_at ASC, created_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE comment_deletion_jobs jobs
            SET
                status = 'leased',
                attempts = jobs.attempts + 1,
                leased_by = $2,
                lease_token = gen_random_uuid()::TEXT,
                lease_expires_at = now() + make_interval(secs => $3::INT),
                updated_at = now()
            FROM candidate_jobs
            WHERE jobs.id = candidate_jobs.id
            RETURNING
                jobs.id,
                jobs.retention_minutes,
                jobs.is_cron,
                jobs.attempts,
                jobs.max_attempts,
                jobs.lease_token
            "#,
        )
        .bind(limit)
        .bind(worker_id)
        .bind(lease_seconds)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to claim deletion jobs for worker '{worker_id}': {error}"
            ))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit deletion job claim transaction: {error}"
            ))
        })?;

        rows.into_iter().map(claimed_job_from_row).collect()
    }

    async fn complete_job(
        &self,
        job_id: DeletionJobId,
        worker_id: &str,
        lease_token: &str,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE comment_deletion_jobs
            SET
                status = 'completed',
                leased_by = NULL,
                lease_token = NULL,
                lease_expires_at = NULL,
                last_error = NULL,
                updated_at = now()
            WHERE id = $1
              AND leased_by = $2
              AND lease_token = $3
              AND status = 'leased'
            "#,
        )
        .bind(job_id.as_uuid())
        .bind(worker_id)
        .bind(lease_token)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to complete deletion job '{job_id}' for worker '{worker_id}': {error}"
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "deletion job '{job_id}' is not currently leased by worker '{worker_id}' with matching lease token"
            )));
        }

        Ok(())
    }

    async fn fail_job(
        &self,
        job_id: DeletionJobId,
        worker_id: &str,
        lease_token: &str,
        error_message: &str,
        retry_after_seconds: u32,
    ) -> AppResult<DeletionJobFailureOutcome> {
        let retry_after_seconds = i32::try_from(retry_after_seconds).unwrap_or(i32::MAX);

        let row = sqlx::query_as::<_, FailedJobRow>(
            r#"
            UPDATE comment_deletion_jobs
            SET
                status = CASE
                    WHEN attempts >= max_attempts THEN 'dead_lettered'
                    ELSE 'pending'
                END,
                available_at = now() + make_interval(secs => $5::INT),
                leased_by = NULL,
                lease_token = NULL,
                lease_expires_at = NULL,
                last_error = $4,
                updated_at = now()
            WHERE id = $1
              AND leased_by = $2
              AND lease_token = $3
              AND status = 'leased'
            RETURNING status
            "#,
        )
        .bind(job_id.as_uuid())
        .bind(worker_id)
        .bind(lease_token)
        .bind(error_message)
        .bind(retry_after_seconds)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to mark deletion job '{job_id}' as failed for worker '{worker_id}': {error}"
            ))
        })?
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "deletion job '{job_id}' is not currently leased by worker '{worker_id}' with matching lease token"
            ))
        })?;

        match row.status.as_str() {
            "dead_lettered" => Ok(DeletionJobFailureOutcome::DeadLettered),
            "pending" => Ok(DeletionJobFailureOutcome::Rescheduled),
            other => Err(AppError::Internal(format!(
                "unexpected deletion job status '{other}' after failure"
            ))),
        }
    }
}

fn claimed_job_from_row(row: ClaimedJobRow) -> AppResult<ClaimedDeletionJob> {
    let retention_minutes = RetentionMinutes::new(row.retention_minutes).map_err(|error| {
        AppError::Internal(format!(
            "deletion job '{}' has invalid persisted retention: {error}",
            row.id
        ))
    })?;
    let attempt = u32::try_from(row.attempts).map_err(|error| {
        AppError::Internal(format!(
            "deletion job '{}' has invalid attempts value: {error}",
            row.id
        ))
    })?;
    let max_attempts = u32::try_from(row.max_attempts).map_err(|error| {
        AppError::Internal(format!(
            "deletion job '{}' has invalid max_attempts value: {error}",
            row.id
        ))
    })?;

    Ok(ClaimedDeletionJob {
        job_id: DeletionJobId::from_uuid(row.id),
        job: DeletionJob::new(retention_minutes, row.is_cron),
        attempt,
        max_attempts,
        lease_token: row.lease_token,
    })
}
