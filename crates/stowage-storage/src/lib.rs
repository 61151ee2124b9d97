//! Stowage Storage Library
//!
//! This crate provides the `Storage` abstraction the attachment layer talks to,
//! with implementations for S3 (and S3-compatible providers) and the local
//! filesystem.
//!
//! # Addressing
//!
//! Every object is addressed by a `(bucket, key)` pair. Keys are slash-separated
//! and must not contain `..` or start with `/`; validation is centralized in the
//! `keys` module so all backends reject the same inputs.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use stowage_core::StorageBackend;
pub use traits::{ObjectMetadata, Storage, StorageError, StorageResult};
