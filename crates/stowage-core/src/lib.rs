//! Stowage Core Library
//!
//! This crate provides the configuration, error taxonomy, shared models and
//! tracing setup used by every Stowage component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod telemetry;

// Re-export commonly used types
pub use config::StorageConfig;
pub use error::{AppError, AppResult, ErrorMetadata, LogLevel};
pub use models::{
    AttachmentConfig, FilenamePolicy, StoredFileReference, ThumbnailMode, UploadTarget,
    UploadedFile, VariationSpec,
};
pub use storage_types::StorageBackend;
pub use telemetry::{init_telemetry, init_telemetry_for};
