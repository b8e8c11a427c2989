use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guestbook_application::CommentRepository;
use guestbook_core::{AppError, AppResult};
use guestbook_domain::{Comment, CommentId, EmailAddress, ImageAttachment, NewComment};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed comment repository.
#[derive(Clone)]
pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    /// Creates a comment repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: uuid::Uuid,
    author_email: String,
    body: String,
    image_url: Option<String>,
    image_key: Option<String>,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create_comment(&self, comment: NewComment) -> AppResult<Comment> {
        let comment_id = CommentId::new();
        let attachment = comment.attachment();

        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (
                id,
                author_email,
                body,
                image_url,
                image_key,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING id, author_email, body, image_url, image_key, created_at
            "#,
        )
        .bind(comment_id.as_uuid())
        .bind(comment.author_email().as_str())
        .bind(comment.text())
        .bind(attachment.map(ImageAttachment::url))
        .bind(attachment.map(ImageAttachment::storage_key))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to store comment for author '{}': {error}",
                comment.author_email().as_str()
            ))
        })?;

        comment_from_row(row)
    }

    async fn list_comments(&self) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, author_email, body, image_url, image_key, created_at
            FROM comments
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list comments: {error}")))?;

        rows.into_iter().map(comment_from_row).collect()
    }

    async fn list_comments_by_author(
        &self,
        author_email: &EmailAddress,
    ) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, author_email, body, image_url, image_key, created_at
            FROM comments
            WHERE author_email = $1
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(author_email.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list comments for author '{}': {error}",
                author_email.as_str()
            ))
        })?;

        rows.into_iter().map(comment_from_row).collect()
    }

    async fn delete_comments_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE created_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::DeletionExecution(format!(
                "failed to delete comments created before {cutoff}: {error}"
            ))
        })?;

        Ok(result.rows_affected())
    }
}

fn comment_from_row(row: CommentRow) -> AppResult<Comment> {
    let attachment = ImageAttachment::from_optional_parts(row.image_url, row.image_key)?;
    Comment::from_stored(
        CommentId::from_uuid(row.id),
        row.author_email,
        row.body,
        row.created_at,
        attachment,
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use guestbook_application::CommentRepository;
    use guestbook_domain::{EmailAddress, ImageAttachment, NewComment};
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;

    use super::PostgresCommentRepository;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for postgres comment tests: {error}");
        }

        Some(pool)
    }

    fn unique_author() -> String {
        format!("pg-{}@example.com", uuid::Uuid::new_v4().simple())
    }

    #[tokio::test]
    async fn stored_comment_keeps_attachment_pair() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let repository = PostgresCommentRepository::new(pool);
        let author = unique_author();

        let attachment = ImageAttachment::new("http://localhost/images/k.png", "k.png")
            .unwrap_or_else(|_| unreachable!());
        let comment = NewComment::new(author.as_str(), "with picture")
            .unwrap_or_else(|_| unreachable!())
            .with_attachment(attachment);

        let stored = repository.create_comment(comment).await;
        assert!(stored.is_ok());
        let stored = stored.unwrap_or_else(|_| unreachable!());
        assert_eq!(stored.image_key(), Some("k.png"));

        let listed = repository
            .list_comments_by_author(
                &EmailAddress::new(author.as_str()).unwrap_or_else(|_| unreachable!()),
            )
            .await;
        assert!(listed.is_ok());
        let listed = listed.unwrap_or_default();
        assert_eq!(listed.len(), 1);
        assert_eq!(
            listed.first().and_then(|comment| comment.image_url()),
            Some("http://localhost/images/k.png")
        );
    }

    #[tokio::test]
    async fn delete_before_cutoff_is_idempotent() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let repository = PostgresCommentRepository::new(pool.clone());
        let author = unique_author();

        let comment = NewComment::new(author.as_str(), "old news").unwrap_or_else(|_| unreachable!());
        let stored = repository.create_comment(comment).await;
        assert!(stored.is_ok());
        let stored = stored.unwrap_or_else(|_| unreachable!());

        let backdate = sqlx::query("UPDATE comments SET created_at = $2 WHERE id = $1")
            .bind(stored.id().as_uuid())
            .bind(Utc::now() - TimeDelta::days(36_500))
            .execute(&pool)
            .await;
        assert!(backdate.is_ok());

        let cutoff = Utc::now() - TimeDelta::days(36_000);
        let first = repository.delete_comments_created_before(cutoff).await;
        assert!(first.is_ok());
        assert!(first.unwrap_or_default() >= 1);

        let second = repository.delete_comments_created_before(cutoff).await;
        assert!(second.is_ok());
        assert_eq!(second.unwrap_or(1), 0);
    }
}
