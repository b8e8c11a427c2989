use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use guestbook_core::{AppError, AppResult};
use guestbook_domain::{Comment, CommentId, EmailAddress, ImageAttachment, NewComment};

use crate::comment_ports::{AttachmentResolver, CommentRepository, ImageUpload};

use super::{CommentService, SubmitCommentInput};

#[derive(Default)]
struct FakeCommentRepository {
    reject_writes: bool,
    comments: Mutex<Vec<Comment>>,
}

#[async_trait]
impl CommentRepository for FakeCommentRepository {
    async fn create_comment(&self, comment: NewComment) -> AppResult<Comment> {
        if self.reject_writes {
            return Err(AppError::Internal("comments table unavailable".to_owned()));
        }

        let comment = comment.into_comment(CommentId::new(), Utc::now());
        self.comments.lock().await.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self) -> AppResult<Vec<Comment>> {
        Ok(self.comments.lock().await.clone())
    }

    async fn list_comments_by_author(
        &self,
        author_email: &EmailAddress,
    ) -> AppResult<Vec<Comment>> {
        Ok(self
            .comments
            .lock()
            .await
            .iter()
            .filter(|comment| comment.author_email() == author_email)
            .cloned()
            .collect())
    }

    async fn delete_comments_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut comments = self.comments.lock().await;
        let before = comments.len();
        comments.retain(|comment| comment.created_at() >= cutoff);
        Ok((before - comments.len()) as u64)
    }
}

#[derive(Default)]
struct FakeAttachmentResolver {
    fail: bool,
    resolved: Mutex<Vec<ImageUpload>>,
    discarded: Mutex<Vec<String>>,
}

#[async_trait]
impl AttachmentResolver for FakeAttachmentResolver {
    async fn resolve_attachment(&self, upload: ImageUpload) -> AppResult<ImageAttachment> {
        if self.fail {
            return Err(AppError::Attachment("image store offline".to_owned()));
        }

        let key = format!("image-{}.png", self.resolved.lock().await.len() + 1);
        self.resolved.lock().await.push(upload);
        ImageAttachment::new(format!("http://localhost/images/{key}"), key)
    }

    async fn discard_attachment(&self, attachment: &ImageAttachment) -> AppResult<()> {
        self.discarded
            .lock()
            .await
            .push(attachment.storage_key().to_owned());
        Ok(())
    }
}

fn png_upload() -> ImageUpload {
    ImageUpload {
        file_name: Some("cat.png".to_owned()),
        bytes: vec![0x89, b'P', b'N', b'G'],
    }
}

fn build_service(
    repository: Arc<FakeCommentRepository>,
    resolver: Arc<FakeAttachmentResolver>,
) -> CommentService {
    CommentService::new(repository, resolver)
}

#[tokio::test]
async fn add_comment_with_image_sets_url_and_key() {
    let repository = Arc::new(FakeCommentRepository::default());
    let service = build_service(repository.clone(), Arc::new(FakeAttachmentResolver::default()));

    let stored = service
        .add_comment(SubmitCommentInput {
            author_email: "guest@example.com".to_owned(),
            text: "hello there".to_owned(),
            image: Some(png_upload()),
        })
        .await;
    assert!(stored.is_ok());
    let stored = stored.unwrap_or_else(|_| unreachable!());

    assert_eq!(
        stored.image_url(),
        Some("http://localhost/images/image-1.png")
    );
    assert_eq!(stored.image_key(), Some("image-1.png"));
    assert_eq!(repository.comments.lock().await.len(), 1);
}

#[tokio::test]
async fn add_comment_without_image_leaves_both_fields_unset() {
    let repository = Arc::new(FakeCommentRepository::default());
    let resolver = Arc::new(FakeAttachmentResolver::default());
    let service = build_service(repository, resolver.clone());

    let stored = service
        .add_comment(SubmitCommentInput {
            author_email: "guest@example.com".to_owned(),
            text: "no picture".to_owned(),
            image: Some(ImageUpload {
                file_name: Some(String::new()),
                bytes: Vec::new(),
            }),
        })
        .await;
    assert!(stored.is_ok());
    let stored = stored.unwrap_or_else(|_| unreachable!());

    assert_eq!(stored.image_url(), None);
    assert_eq!(stored.image_key(), None);
    assert!(resolver.resolved.lock().await.is_empty());
}

#[tokio::test]
async fn failed_attachment_resolution_stores_nothing() {
    let repository = Arc::new(FakeCommentRepository::default());
    let resolver = Arc::new(FakeAttachmentResolver {
        fail: true,
        ..FakeAttachmentResolver::default()
    });
    let service = build_service(repository.clone(), resolver);

    let result = service
        .add_comment(SubmitCommentInput {
            author_email: "guest@example.com".to_owned(),
            text: "broken image".to_owned(),
            image: Some(png_upload()),
        })
        .await;

    assert!(matches!(result, Err(AppError::Attachment(_))));
    assert!(repository.comments.lock().await.is_empty());
}

#[tokio::test]
async fn image_is_discarded_when_comment_cannot_be_stored() {
    let repository = Arc::new(FakeCommentRepository {
        reject_writes: true,
        ..FakeCommentRepository::default()
    });
    let resolver = Arc::new(FakeAttachmentResolver::default());
    let service = build_service(repository, resolver.clone());

    let result = service
        .add_comment(SubmitCommentInput {
            author_email: "guest@example.com".to_owned(),
            text: "lost write".to_owned(),
            image: Some(png_upload()),
        })
        .await;

    assert!(matches!(result, Err(AppError::Internal(message)) if message.contains("comments table")));
    assert_eq!(*resolver.discarded.lock().await, vec!["image-1.png".to_owned()]);
}

#[tokio::test]
async fn failed_write_without_image_discards_nothing() {
    let repository = Arc::new(FakeCommentRepository {
        reject_writes: true,
        ..FakeCommentRepository::default()
    });
    let resolver = Arc::new(FakeAttachmentResolver::default());
    let service = build_service(repository, resolver.clone());

    let result = service
        .add_comment(SubmitCommentInput {
            author_email: "guest@example.com".to_owned(),
            text: "text only".to_owned(),
            image: None,
        })
        .await;

    assert!(result.is_err());
    assert!(resolver.discarded.lock().await.is_empty());
}

#[tokio::test]
async fn invalid_submission_is_rejected_before_image_is_stored() {
    let resolver = Arc::new(FakeAttachmentResolver::default());
    let service = build_service(Arc::new(FakeCommentRepository::default()), resolver.clone());

    let result = service
        .add_comment(SubmitCommentInput {
            author_email: "not-an-email".to_owned(),
            text: "hello".to_owned(),
            image: Some(png_upload()),
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(resolver.resolved.lock().await.is_empty());
}

#[tokio::test]
async fn list_for_author_requires_email() {
    let service = build_service(
        Arc::new(FakeCommentRepository::default()),
        Arc::new(FakeAttachmentResolver::default()),
    );

    assert!(matches!(
        service.list_comments_for_author(None).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        service.list_comments_for_author(Some("  ")).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn list_for_author_filters_case_insensitively() {
    let repository = Arc::new(FakeCommentRepository::default());
    let service = build_service(repository, Arc::new(FakeAttachmentResolver::default()));

    for (author, text) in [
        ("alice@example.com", "first"),
        ("bob@example.com", "second"),
        ("Alice@Example.com", "third"),
    ] {
        let result = service
            .add_comment(SubmitCommentInput {
                author_email: author.to_owned(),
                text: text.to_owned(),
                image: None,
            })
            .await;
        assert!(result.is_ok());
    }

    let comments = service
        .list_comments_for_author(Some("ALICE@example.com"))
        .await;
    assert!(comments.is_ok());
    let texts: Vec<String> = comments
        .unwrap_or_default()
        .iter()
        .map(|comment| comment.text().to_owned())
        .collect();
    assert_eq!(texts, vec!["first".to_owned(), "third".to_owned()]);
}
