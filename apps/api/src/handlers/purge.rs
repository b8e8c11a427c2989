use axum::Form;
use axum::extract::rejection::FormRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use guestbook_application::PurgeResponseShape;
use guestbook_core::AppError;
use tracing::info;

use crate::dto::PurgeParams;
use crate::error::{ApiError, ApiResult};
use crate::handlers::LISTING_PATH;
use crate::state::AppState;

/// Schedules a purge and answers according to who asked.
///
/// Interactive callers are redirected to the listing. Schedulers get a plain
/// 200 page, since they treat anything outside 2xx as a failed run.
pub async fn remove_old_comments_handler(
    State(state): State<AppState>,
    Query(params): Query<PurgeParams>,
) -> ApiResult<Response> {
    let triggered = state
        .purge_service
        .trigger_purge(
            params.retention_in_minutes.as_deref(),
            params.is_cron.as_deref(),
        )
        .await?;

    info!(
        job_id = %triggered.handle.job_id,
        retention_minutes = triggered.job.retention_minutes().get(),
        is_cron = triggered.job.is_cron(),
        "comment purge scheduled"
    );

    match triggered.response_shape {
        PurgeResponseShape::Redirect => Ok(Redirect::to(LISTING_PATH).into_response()),
        PurgeResponseShape::NeutralOk => {
            let page = state.views.render_index("OK")?;
            Ok((StatusCode::OK, Html(page)).into_response())
        }
    }
}

/// Deletes expired comments now. Called by the job runner, never by users.
pub async fn remove_old_comments_task_handler(
    State(state): State<AppState>,
    Query(query): Query<PurgeParams>,
    form: Result<Form<PurgeParams>, FormRejection>,
) -> ApiResult<String> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(FormRejection::InvalidFormContentType(_)) => PurgeParams::default(),
        Err(rejection) => {
            return Err(ApiError(AppError::Validation(format!(
                "invalid deletion task form: {}",
                rejection.body_text()
            ))));
        }
    };
    let params = form.or(query);

    let acknowledgement = state
        .purge_service
        .handle_deletion_task(
            params.retention_in_minutes.as_deref(),
            params.is_cron.as_deref(),
        )
        .await?;

    info!(
        deleted_comments = acknowledgement.deleted_comments,
        retention_minutes = acknowledgement.job.retention_minutes().get(),
        is_cron = acknowledgement.job.is_cron(),
        cutoff = %acknowledgement.cutoff,
        "old comments removed"
    );

    Ok(acknowledgement.message())
}
