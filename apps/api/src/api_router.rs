use std::path::Path;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

// Room for the text fields sent alongside an image of the maximum size.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(app_state: AppState, image_dir: &Path, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::comments::root_handler))
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/getAllComments",
            get(handlers::comments::list_comments_handler),
        )
        .route(
            "/getCommentsForUser",
            get(handlers::comments::list_comments_for_user_handler),
        )
        .route(
            "/addComment",
            post(handlers::comments::add_comment_handler),
        )
        .route(
            "/removeOldComments",
            get(handlers::purge::remove_old_comments_handler),
        )
        .route(
            "/removeOldCommentsTaskHandler",
            post(handlers::purge::remove_old_comments_task_handler),
        )
        .nest_service("/images", ServeDir::new(image_dir))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
