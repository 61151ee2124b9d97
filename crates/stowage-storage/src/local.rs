use crate::keys::{encode_key, validate_bucket, validate_key};
use crate::traits::{ObjectMetadata, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use walkdir::WalkDir;

/// Local filesystem storage implementation
///
/// Buckets are directories directly below `base_path`; keys map to relative
/// paths inside them.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/stowage")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    fn bucket_path(&self, bucket: &str) -> StorageResult<PathBuf> {
        validate_bucket(bucket)?;
        Ok(self.base_path.join(bucket))
    }

    /// Convert a bucket/key pair to a filesystem path with security validation
    fn key_to_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.bucket_path(bucket)?.join(key))
    }

    /// Generate public URL for file
    fn generate_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            bucket,
            encode_key(key)
        )
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        _metadata: &ObjectMetadata,
    ) -> StorageResult<()> {
        let path = self.key_to_path(bucket, key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let size = fs::copy(source, &path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                source.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(bucket, key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(bucket, key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(bucket, key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>> {
        let root = self.bucket_path(bucket)?;
        if !fs::try_exists(&root).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        tokio::task::spawn_blocking(move || -> StorageResult<Vec<String>> {
            let mut keys = Vec::new();
            for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
                let entry = entry.map_err(|e| StorageError::BackendError(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Ok(relative) = entry.path().strip_prefix(&root) {
                    let key = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect::<Vec<_>>()
                        .join("/");
                    keys.push(key);
                }
            }
            Ok(keys)
        })
        .await
        .map_err(|e| StorageError::BackendError(format!("Listing task failed: {}", e)))?
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(bucket, key)?;
        Ok(self.generate_url(bucket, key))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.generate_url(bucket, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
