use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use guestbook_application::{AttachmentResolver, ImageUpload};
use guestbook_core::{AppError, AppResult};
use guestbook_domain::ImageAttachment;
use url::Url;

/// Stores uploaded images on the local filesystem.
///
/// Files land in `storage_dir/<uuid>.<ext>` and are served under
/// `<public_base_url>/images/<uuid>.<ext>`. The file type is sniffed from the
/// bytes.
pub struct FilesystemAttachmentResolver {
    storage_dir: PathBuf,
    public_base_url: Url,
    max_bytes: usize,
}

impl FilesystemAttachmentResolver {
    /// Creates a resolver writing below `storage_dir`.
    pub fn new(
        storage_dir: impl Into<PathBuf>,
        public_base_url: &str,
        max_bytes: usize,
    ) -> AppResult<Self> {
        let mut public_base_url = Url::parse(public_base_url).map_err(|error| {
            AppError::Validation(format!(
                "invalid public base url '{public_base_url}': {error}"
            ))
        })?;
        if !public_base_url.path().ends_with('/') {
            let path = format!("{}/", public_base_url.path());
            public_base_url.set_path(path.as_str());
        }

        Ok(Self {
            storage_dir: storage_dir.into(),
            public_base_url,
            max_bytes,
        })
    }

    fn public_url_for(&self, storage_key: &str) -> AppResult<Url> {
        self.public_base_url
            .join(format!("images/{storage_key}").as_str())
            .map_err(|error| {
                AppError::Attachment(format!(
                    "failed to build public url for image '{storage_key}': {error}"
                ))
            })
    }
}

#[async_trait]
impl AttachmentResolver for FilesystemAttachmentResolver {
    async fn resolve_attachment(&self, upload: ImageUpload) -> AppResult<ImageAttachment> {
        if upload.is_empty() {
            return Err(AppError::Attachment("image upload is empty".to_owned()));
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(AppError::Attachment(format!(
                "image upload of {} bytes exceeds the {} byte limit",
                upload.bytes.len(),
                self.max_bytes
            )));
        }

        let kind = infer::get(&upload.bytes)
            .filter(|kind| kind.mime_type().starts_with("image/"))
            .ok_or_else(|| {
                AppError::Attachment(format!(
                    "upload '{}' is not a recognized image",
                    upload.file_name.as_deref().unwrap_or("<unnamed>")
                ))
            })?;

        let storage_key = format!("{}.{}", uuid::Uuid::new_v4(), kind.extension());
        let url = self.public_url_for(storage_key.as_str())?;

        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .map_err(|error| {
                AppError::Attachment(format!(
                    "failed to create image directory '{}': {error}",
                    self.storage_dir.display()
                ))
            })?;

        let path = self.storage_dir.join(storage_key.as_str());
        let temp_path = self.storage_dir.join(format!("{storage_key}.tmp"));
        tokio::fs::write(&temp_path, &upload.bytes)
            .await
            .map_err(|error| {
                AppError::Attachment(format!(
                    "failed to write image '{}': {error}",
                    temp_path.display()
                ))
            })?;
        tokio::fs::rename(&temp_path, &path).await.map_err(|error| {
            AppError::Attachment(format!(
                "failed to move image into place at '{}': {error}",
                path.display()
            ))
        })?;

        tracing::debug!(
            storage_key = %storage_key,
            mime_type = kind.mime_type(),
            bytes = upload.bytes.len(),
            "stored comment image"
        );

        ImageAttachment::new(url.as_str(), storage_key)
    }

    async fn discard_attachment(&self, attachment: &ImageAttachment) -> AppResult<()> {
        let storage_key = attachment.storage_key();
        // Keys are bare file names minted by this resolver.
        if Path::new(storage_key).file_name() != Some(OsStr::new(storage_key)) {
            return Err(AppError::Attachment(format!(
                "refusing to discard image with invalid storage key '{storage_key}'"
            )));
        }

        let path = self.storage_dir.join(storage_key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(storage_key = %storage_key, "discarded comment image");
                Ok(())
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AppError::Attachment(format!(
                "failed to discard image '{}': {error}",
                path.display()
            ))),
        }
    }
}
