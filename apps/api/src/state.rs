use std::sync::Arc;

use guestbook_application::{CommentService, PurgeService};

use crate::views::Views;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub comment_service: CommentService,
    pub purge_service: PurgeService,
    pub views: Arc<Views>,
}
