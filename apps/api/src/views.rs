//! Server-rendered HTML views.

use guestbook_core::{AppError, AppResult};
use guestbook_domain::{COMMENT_TEXT_MAX_LENGTH, Comment};
use minijinja::{Environment, context};

use crate::dto::CommentView;

const GUESTBOOK_TEMPLATE: &str = "guestbook.html";
const INDEX_TEMPLATE: &str = "index.html";

/// Compiled page templates.
pub struct Views {
    environment: Environment<'static>,
}

impl Views {
    /// Loads the templates embedded in the binary.
    pub fn load() -> AppResult<Self> {
        let mut environment = Environment::new();
        environment
            .add_template(
                GUESTBOOK_TEMPLATE,
                include_str!("../templates/guestbook.html"),
            )
            .map_err(|error| {
                AppError::Internal(format!("failed to compile {GUESTBOOK_TEMPLATE}: {error}"))
            })?;
        environment
            .add_template(INDEX_TEMPLATE, include_str!("../templates/index.html"))
            .map_err(|error| {
                AppError::Internal(format!("failed to compile {INDEX_TEMPLATE}: {error}"))
            })?;

        Ok(Self { environment })
    }

    /// Renders the comment listing with the new-comment form.
    ///
    /// `author_email` prefills the form and filter when the listing is
    /// scoped to one author.
    pub fn render_guestbook(
        &self,
        comments: &[Comment],
        author_email: Option<&str>,
    ) -> AppResult<String> {
        let comments: Vec<CommentView> = comments.iter().map(CommentView::from).collect();
        self.render(
            GUESTBOOK_TEMPLATE,
            context! {
                comments => comments,
                author_email => author_email,
                max_text_length => COMMENT_TEXT_MAX_LENGTH,
            },
        )
    }

    /// Renders the neutral confirmation page.
    pub fn render_index(&self, message: &str) -> AppResult<String> {
        self.render(INDEX_TEMPLATE, context! { message => message })
    }

    fn render(&self, name: &str, context: minijinja::Value) -> AppResult<String> {
        self.environment
            .get_template(name)
            .and_then(|template| template.render(context))
            .map_err(|error| AppError::Internal(format!("failed to render {name}: {error}")))
    }
}
