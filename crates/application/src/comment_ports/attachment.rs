use async_trait::async_trait;
use guestbook_core::AppResult;
use guestbook_domain::ImageAttachment;

/// Raw image upload extracted from a comment submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Client supplied file name, if any.
    pub file_name: Option<String>,
    /// Uploaded bytes.
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Returns true when the upload carries no data.
    ///
    /// Browsers send an empty file part when the user picked no file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Port that stores uploaded images and resolves them to servable URLs.
#[async_trait]
pub trait AttachmentResolver: Send + Sync {
    /// Stores one upload and returns its servable URL with its storage key.
    async fn resolve_attachment(&self, upload: ImageUpload) -> AppResult<ImageAttachment>;

    /// Removes a stored image that no comment will reference.
    ///
    /// Discarding an image that is already gone succeeds.
    async fn discard_attachment(&self, attachment: &ImageAttachment) -> AppResult<()>;
}
