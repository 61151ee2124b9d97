//! Shared key validation for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Reject keys that could escape their bucket or are otherwise unusable.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid path segments: {}",
            key
        )));
    }
    Ok(())
}

/// Buckets are a single path segment.
pub fn validate_bucket(bucket: &str) -> StorageResult<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {}",
            bucket
        )));
    }
    Ok(())
}

/// Percent-encode each segment of a key for use in a URL path.
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
