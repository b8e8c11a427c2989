mod attachment;
mod repository;

pub use attachment::{AttachmentResolver, ImageUpload};
pub use repository::CommentRepository;
