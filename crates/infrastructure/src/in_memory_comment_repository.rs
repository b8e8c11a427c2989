use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guestbook_application::CommentRepository;
use guestbook_core::AppResult;
use guestbook_domain::{Comment, CommentId, EmailAddress, NewComment};
use tokio::sync::RwLock;

/// In-memory comment repository for local runs and tests.
#[derive(Default)]
pub struct InMemoryCommentRepository {
    comments: RwLock<Vec<Comment>>,
}

impl InMemoryCommentRepository {
    /// Creates an empty in-memory comment repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a comment with an explicit creation timestamp.
    pub async fn insert_comment(&self, comment: NewComment, created_at: DateTime<Utc>) -> Comment {
        let comment = comment.into_comment(CommentId::new(), created_at);
        self.comments.write().await.push(comment.clone());
        comment
    }

    /// Returns the number of stored comments.
    pub async fn len(&self) -> usize {
        self.comments.read().await.len()
    }

    /// Returns true when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.comments.read().await.is_empty()
    }
}

fn newest_first(mut comments: Vec<Comment>) -> Vec<Comment> {
    comments.sort_by(|left, right| {
        right
            .created_at()
            .cmp(&left.created_at())
            .then_with(|| left.id().as_uuid().cmp(&right.id().as_uuid()))
    });
    comments
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn create_comment(&self, comment: NewComment) -> AppResult<Comment> {
        Ok(self.insert_comment(comment, Utc::now()).await)
    }

    async fn list_comments(&self) -> AppResult<Vec<Comment>> {
        Ok(newest_first(self.comments.read().await.clone()))
    }

    async fn list_comments_by_author(
        &self,
        author_email: &EmailAddress,
    ) -> AppResult<Vec<Comment>> {
        let comments = self
            .comments
            .read()
            .await
            .iter()
            .filter(|comment| comment.author_email() == author_email)
            .cloned()
            .collect();

        Ok(newest_first(comments))
    }

    async fn delete_comments_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut comments = self.comments.write().await;
        let before = comments.len();
        comments.retain(|comment| comment.created_at() >= cutoff);

        Ok(u64::try_from(before - comments.len()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use guestbook_application::CommentRepository;
    use guestbook_domain::{EmailAddress, NewComment};

    use super::InMemoryCommentRepository;

    fn new_comment(author: &str, text: &str) -> NewComment {
        NewComment::new(author, text).unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn listings_are_newest_first_and_filter_by_author() {
        let repository = InMemoryCommentRepository::new();
        let now = Utc::now();
        repository
            .insert_comment(new_comment("a@example.com", "older"), now - TimeDelta::minutes(5))
            .await;
        repository
            .insert_comment(new_comment("b@example.com", "other"), now - TimeDelta::minutes(3))
            .await;
        repository
            .insert_comment(new_comment("a@example.com", "newer"), now)
            .await;

        let all = repository.list_comments().await.unwrap_or_default();
        let texts: Vec<&str> = all.iter().map(|comment| comment.text()).collect();
        assert_eq!(texts, vec!["newer", "other", "older"]);

        let author = EmailAddress::new("A@Example.com").unwrap_or_else(|_| unreachable!());
        let mine = repository
            .list_comments_by_author(&author)
            .await
            .unwrap_or_default();
        let texts: Vec<&str> = mine.iter().map(|comment| comment.text()).collect();
        assert_eq!(texts, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn delete_keeps_comments_at_or_after_cutoff() {
        let repository = InMemoryCommentRepository::new();
        let now = Utc::now();
        let cutoff = now - TimeDelta::minutes(60);
        repository
            .insert_comment(new_comment("a@example.com", "boundary"), cutoff)
            .await;
        repository
            .insert_comment(
                new_comment("a@example.com", "expired"),
                cutoff - TimeDelta::seconds(1),
            )
            .await;

        let deleted = repository.delete_comments_created_before(cutoff).await;
        assert!(matches!(deleted, Ok(1)));
        assert_eq!(repository.len().await, 1);

        let deleted_again = repository.delete_comments_created_before(cutoff).await;
        assert!(matches!(deleted_again, Ok(0)));
        assert!(!repository.is_empty().await);
    }
}
