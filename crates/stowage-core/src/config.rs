//! Configuration module
//!
//! Storage client settings are read from the environment once at startup and
//! handed to the storage factory. Per-attribute settings live in
//! [`crate::models::AttachmentConfig`].

use std::env;
use std::time::Duration;

use crate::constants::{DEFAULT_PRESIGNED_URL_TTL, DEFAULT_S3_REGION};
use crate::storage_types::StorageBackend;

/// Storage client configuration
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub environment: String,
    pub storage_backend: StorageBackend,
    pub s3_region: String,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    // Retry/timeout policy belongs to the client, never to the attachment layer
    pub s3_max_retries: Option<usize>,
    pub s3_retry_timeout_secs: Option<u64>,
    pub s3_request_timeout_secs: Option<u64>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub presigned_url_ttl_secs: u64,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let config = StorageConfig {
            environment,
            storage_backend,
            s3_region: var("S3_REGION")
                .or_else(|| var("AWS_REGION"))
                .unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
            s3_endpoint: var("S3_ENDPOINT"),
            aws_access_key_id: var("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            s3_max_retries: parse_optional(&var, "S3_MAX_RETRIES")?,
            s3_retry_timeout_secs: parse_optional(&var, "S3_RETRY_TIMEOUT_SECS")?,
            s3_request_timeout_secs: parse_optional(&var, "S3_REQUEST_TIMEOUT_SECS")?,
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            presigned_url_ttl_secs: parse_optional(&var, "PRESIGNED_URL_TTL_SECS")?
                .unwrap_or(DEFAULT_PRESIGNED_URL_TTL.as_secs()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.presigned_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!(
                "PRESIGNED_URL_TTL_SECS must be greater than zero"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.aws_access_key_id.is_none() {
                    return Err(anyhow::anyhow!(
                        "AWS_ACCESS_KEY_ID must be set when using S3 storage backend"
                    ));
                }
                if self.aws_secret_access_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "AWS_SECRET_ACCESS_KEY must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn presigned_url_ttl(&self) -> Duration {
        Duration::from_secs(self.presigned_url_ttl_secs)
    }

    pub fn s3_retry_timeout(&self) -> Option<Duration> {
        self.s3_retry_timeout_secs.map(Duration::from_secs)
    }

    pub fn s3_request_timeout(&self) -> Option<Duration> {
        self.s3_request_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_optional<T, F>(var: &F, name: &str) -> Result<Option<T>, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{} is not valid ({}): {}", name, raw, e))
        })
        .transpose()
}
