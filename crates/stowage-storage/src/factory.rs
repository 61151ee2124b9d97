#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::{s3::S3Settings, S3Storage};
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use stowage_core::StorageConfig;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            if config.aws_access_key_id.is_none() || config.aws_secret_access_key.is_none() {
                return Err(StorageError::ConfigError(
                    "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set for S3 storage"
                        .to_string(),
                ));
            }

            let storage = S3Storage::new(S3Settings::from(config))?;
            tracing::info!(
                region = %config.s3_region,
                endpoint = ?config.s3_endpoint,
                "S3 storage initialized"
            );
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path.as_str(), base_url).await?;
            tracing::info!(path = %base_path, "Local storage initialized");
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local", feature = "storage-s3"))]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> StorageConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StorageConfig::from_lookup(move |name: &str| vars.get(name).cloned()).unwrap()
    }

    #[tokio::test]
    async fn test_create_local_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files");
        let config = config(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", path.to_str().unwrap()),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:3000/files"),
        ]);

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn test_create_s3_storage() {
        let config = config(&[
            ("STORAGE_BACKEND", "s3"),
            ("S3_REGION", "eu-west-1"),
            ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]);

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::S3);
        assert_eq!(
            storage.public_url("media", "a.png"),
            "https://media.s3.eu-west-1.amazonaws.com/a.png"
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_rejected() {
        let mut config = config(&[
            ("STORAGE_BACKEND", "s3"),
            ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]);
        config.aws_secret_access_key = None;

        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
