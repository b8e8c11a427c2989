use axum::extract::{Multipart, Query, State};
use axum::response::{Html, Redirect};
use guestbook_application::{ImageUpload, SubmitCommentInput};
use guestbook_core::AppError;
use tracing::info;

use crate::dto::CommentsForUserQuery;
use crate::error::ApiResult;
use crate::handlers::LISTING_PATH;
use crate::state::AppState;

pub async fn root_handler() -> Redirect {
    Redirect::to(LISTING_PATH)
}

pub async fn list_comments_handler(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let comments = state.comment_service.list_comments().await?;
    let page = state.views.render_guestbook(&comments, None)?;

    Ok(Html(page))
}

pub async fn list_comments_for_user_handler(
    State(state): State<AppState>,
    Query(query): Query<CommentsForUserQuery>,
) -> ApiResult<Html<String>> {
    let comments = state
        .comment_service
        .list_comments_for_author(query.user_email.as_deref())
        .await?;
    let author_email = comments
        .first()
        .map(|comment| comment.author_email().as_str().to_owned())
        .or(query.user_email);
    let page = state
        .views
        .render_guestbook(&comments, author_email.as_deref())?;

    Ok(Html(page))
}

pub async fn add_comment_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Redirect> {
    let input = read_comment_form(multipart).await?;
    let comment = state.comment_service.add_comment(input).await?;

    info!(
        comment_id = %comment.id(),
        author_email = %comment.author_email().as_str(),
        has_image = comment.attachment().is_some(),
        "comment stored"
    );

    Ok(Redirect::to(LISTING_PATH))
}

async fn read_comment_form(mut multipart: Multipart) -> Result<SubmitCommentInput, AppError> {
    let mut author_email: Option<String> = None;
    let mut text: Option<String> = None;
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|error| {
        AppError::Validation(format!("invalid multipart body: {}", error.body_text()))
    })? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "authorEmail" | "userEmail" => {
                author_email = Some(field.text().await.map_err(|error| {
                    AppError::Validation(format!("invalid {name} field: {}", error.body_text()))
                })?);
            }
            "text" => {
                text = Some(field.text().await.map_err(|error| {
                    AppError::Validation(format!("invalid text field: {}", error.body_text()))
                })?);
            }
            "image" => {
                let file_name = field.file_name().map(ToOwned::to_owned);
                let bytes = field.bytes().await.map_err(|error| {
                    AppError::Attachment(format!(
                        "failed to read image upload: {}",
                        error.body_text()
                    ))
                })?;
                image = Some(ImageUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                })
                .filter(|upload| !upload.is_empty());
            }
            _ => {}
        }
    }

    let author_email = author_email
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation("authorEmail is required".to_owned()))?;

    Ok(SubmitCommentInput {
        author_email,
        text: text.unwrap_or_default(),
        image,
    })
}
