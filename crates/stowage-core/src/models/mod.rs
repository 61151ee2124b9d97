//! Shared models for attachments, uploads and image variations.

pub mod attachment;
pub mod upload;
pub mod variation;

pub use attachment::{AttachmentConfig, FilenamePolicy, StoredFileReference, UploadTarget};
pub use upload::UploadedFile;
pub use variation::{variation_filename, ThumbnailMode, VariationSpec};
