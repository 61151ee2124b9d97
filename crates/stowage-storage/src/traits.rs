//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use stowage_core::AppError;
use thiserror::Error;

/// User metadata stored alongside an object
pub type ObjectMetadata = BTreeMap<String, String>;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::StorageNotFound(key),
            StorageError::ConfigError(msg) => AppError::Configuration(msg),
            other => AppError::StorageTransport(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// The attachment layer is written once against it, so backends are swapped by
/// injecting a different `Arc<dyn Storage>` at startup. Retries and timeouts are
/// a property of the backend, never of its callers.
///
/// Implementations must report a missing object as [`StorageError::NotFound`]
/// and reserve the other variants for transport, auth and local failures.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload the file at `source` to `bucket`/`key`, replacing any existing object.
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        metadata: &ObjectMetadata,
    ) -> StorageResult<()>;

    /// Download an object into memory
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object. A missing object yields `NotFound`.
    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool>;

    /// List every key in a bucket
    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>>;

    /// Generate a presigned/temporary URL for direct access (GET)
    ///
    /// This is useful for giving clients temporary access to private objects
    /// without going through the application server
    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Permanent URL of an object; only reachable when the object is public.
    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_benign_app_error() {
        let err: AppError = StorageError::NotFound("media/a.png".to_string()).into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_failures_map_to_transport_error() {
        for err in [
            StorageError::UploadFailed("timeout".to_string()),
            StorageError::DeleteFailed("403 Forbidden".to_string()),
            StorageError::BackendError("dns".to_string()),
        ] {
            let app: AppError = err.into();
            assert!(matches!(app, AppError::StorageTransport(_)));
        }
    }
}
