use crate::keys::{encode_key, validate_bucket, validate_key};
use crate::traits::{ObjectMetadata, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ClientOptions, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult, RetryConfig,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use stowage_core::StorageConfig;

/// Connection settings shared by every bucket client
#[derive(Clone, Debug, Default)]
pub struct S3Settings {
    pub region: String,
    /// Custom endpoint for S3-compatible providers
    /// (e.g., "http://localhost:9000" for MinIO)
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub max_retries: Option<usize>,
    pub retry_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

impl From<&StorageConfig> for S3Settings {
    fn from(config: &StorageConfig) -> Self {
        Self {
            region: config.s3_region.clone(),
            endpoint_url: config.s3_endpoint.clone(),
            access_key_id: config.aws_access_key_id.clone(),
            secret_access_key: config.aws_secret_access_key.clone(),
            max_retries: config.s3_max_retries,
            retry_timeout: config.s3_retry_timeout(),
            request_timeout: config.s3_request_timeout(),
        }
    }
}

/// S3 storage implementation
///
/// `object_store` binds a client to a single bucket, so one client is built per
/// bucket on first use and reused afterwards.
#[derive(Clone)]
pub struct S3Storage {
    settings: S3Settings,
    stores: Arc<RwLock<HashMap<String, AmazonS3>>>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    pub fn new(settings: S3Settings) -> StorageResult<Self> {
        if settings.region.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "S3 region must not be empty".to_string(),
            ));
        }

        Ok(S3Storage {
            settings,
            stores: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn build_store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        let settings = &self.settings;
        let mut builder = AmazonS3Builder::from_env()
            .with_region(settings.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref key_id) = settings.access_key_id {
            builder = builder.with_access_key_id(key_id.clone());
        }
        if let Some(ref secret) = settings.secret_access_key {
            builder = builder.with_secret_access_key(secret.clone());
        }

        if let Some(ref endpoint) = settings.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        if settings.max_retries.is_some() || settings.retry_timeout.is_some() {
            let defaults = RetryConfig::default();
            builder = builder.with_retry(RetryConfig {
                max_retries: settings.max_retries.unwrap_or(defaults.max_retries),
                retry_timeout: settings.retry_timeout.unwrap_or(defaults.retry_timeout),
                ..defaults
            });
        }

        if let Some(timeout) = settings.request_timeout {
            builder = builder.with_client_options(ClientOptions::new().with_timeout(timeout));
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    /// Client for `bucket`, built on first use
    fn store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        validate_bucket(bucket)?;

        if let Some(store) = self
            .stores
            .read()
            .map_err(|_| StorageError::BackendError("S3 client cache poisoned".to_string()))?
            .get(bucket)
        {
            return Ok(store.clone());
        }

        let store = self.build_store(bucket)?;
        tracing::debug!(bucket = %bucket, region = %self.settings.region, "S3 client created");

        let mut stores = self
            .stores
            .write()
            .map_err(|_| StorageError::BackendError("S3 client cache poisoned".to_string()))?;
        Ok(stores.entry(bucket.to_string()).or_insert(store).clone())
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style URLs under the endpoint
    fn generate_url(&self, bucket: &str, key: &str) -> String {
        let key = encode_key(key);
        if let Some(ref endpoint) = self.settings.endpoint_url {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                bucket, self.settings.region, key
            )
        }
    }

    fn attributes(metadata: &ObjectMetadata) -> Attributes {
        let mut attributes = Attributes::new();
        for (name, value) in metadata {
            attributes.insert(
                Attribute::Metadata(name.clone().into()),
                AttributeValue::from(value.clone()),
            );
        }
        attributes
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        source: &std::path::Path,
        metadata: &ObjectMetadata,
    ) -> StorageResult<()> {
        validate_key(key)?;
        let store = self.store(bucket)?;

        let data = tokio::fs::read(source).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read {}: {}", source.display(), e))
        })?;
        let size = data.len() as u64;
        let location = Path::from(key.to_string());
        let options = PutOptions {
            attributes: Self::attributes(metadata),
            ..Default::default()
        };

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = object_store::ObjectStore::put_opts(
            &store,
            &location,
            PutPayload::from(Bytes::from(data)),
            options,
        )
        .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        validate_key(key)?;
        let store = self.store(bucket)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes.to_vec())
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let store = self.store(bucket)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = store.delete(&location).await;

        result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                StorageError::DeleteFailed(other.to_string())
            }
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let store = self.store(bucket)?;
        let location = Path::from(key.to_string());
        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>> {
        let store = self.store(bucket)?;
        let start = std::time::Instant::now();

        let objects: Vec<_> = object_store::ObjectStore::list(&store, None)
            .try_collect()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        tracing::debug!(
            bucket = %bucket,
            count = objects.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list successful"
        );

        Ok(objects
            .into_iter()
            .map(|meta| meta.location.to_string())
            .collect())
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(key)?;
        let store = self.store(bucket)?;
        let location = Path::from(key.to_string());
        let url_result: ObjectResult<_> = store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.generate_url(bucket, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(all(test, feature = "storage-s3"))]
mod tests {
    use super::*;

    fn settings(endpoint: Option<&str>) -> S3Settings {
        S3Settings {
            region: "us-east-2".to_string(),
            endpoint_url: endpoint.map(String::from),
            access_key_id: Some("AKIAEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_public_url_aws() {
        let storage = S3Storage::new(settings(None)).unwrap();
        assert_eq!(
            storage.public_url("media", "uploads/7/a b.png"),
            "https://media.s3.us-east-2.amazonaws.com/uploads/7/a%20b.png"
        );
    }

    #[test]
    fn test_public_url_custom_endpoint() {
        let storage = S3Storage::new(settings(Some("http://localhost:9000/"))).unwrap();
        assert_eq!(
            storage.public_url("media", "uploads/7/a.png"),
            "http://localhost:9000/media/uploads/7/a.png"
        );
    }

    #[test]
    fn test_empty_region_rejected() {
        let mut settings = settings(None);
        settings.region = String::new();
        assert!(matches!(
            S3Storage::new(settings),
            Err(StorageError::ConfigError(_))
        ));
    }

    #[test]
    fn test_store_is_cached_per_bucket() {
        let storage = S3Storage::new(settings(Some("http://localhost:9000"))).unwrap();
        storage.store("media").unwrap();
        storage.store("media").unwrap();
        storage.store("archive").unwrap();
        assert_eq!(storage.stores.read().unwrap().len(), 2);
        assert!(storage.store("bad/bucket").is_err());
    }

    #[tokio::test]
    async fn test_presigned_url_is_signed_locally() {
        let storage = S3Storage::new(settings(None)).unwrap();
        let url = storage
            .presigned_url("media", "uploads/1/a.png", Duration::from_secs(600))
            .await
            .unwrap();
        assert!(url.contains("uploads/1/a.png"));
        assert!(url.contains("X-Amz-Expires=600"));
        assert!(url.contains("X-Amz-Signature="));
    }
}
