//! Attachment behavior
//!
//! One [`AttachmentBehavior`] is built per managed attribute when the
//! application starts. It owns the attribute's configuration and the injected
//! storage client, hands out a [`LifecycleCoordinator`] for every save or
//! delete cycle and answers URL/existence queries for records.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stowage_core::constants::{
    DEFAULT_PRESIGNED_URL_TTL, ORIGINAL_FILENAME_METADATA_KEY, UPLOADED_AT_METADATA_KEY,
};
use stowage_core::models::variation_filename;
use stowage_core::{AppError, AppResult, AttachmentConfig, StoredFileReference, VariationSpec};
use stowage_processing::VariantGenerator;
use stowage_storage::{ObjectMetadata, Storage};
use tokio::fs;

use crate::coordinator::LifecycleCoordinator;
use crate::filename::FilenameStrategy;
use crate::listener::UploadListener;
use crate::path::PathResolver;
use crate::record::Record;

#[derive(Clone)]
pub struct AttachmentBehavior {
    config: Arc<AttachmentConfig>,
    storage: Arc<dyn Storage>,
    filename: FilenameStrategy,
    listeners: Vec<Arc<dyn UploadListener>>,
    variants: VariantGenerator,
    presigned_ttl: Duration,
}

impl AttachmentBehavior {
    /// Validates `config`; an invalid configuration never reaches a request.
    pub fn new(config: AttachmentConfig, storage: Arc<dyn Storage>) -> AppResult<Self> {
        config.validate()?;

        tracing::debug!(
            attribute = %config.attribute,
            bucket = %config.bucket,
            variations = config.variations.len(),
            "Attachment behavior configured"
        );

        Ok(Self {
            filename: config.filename_policy.into(),
            variants: VariantGenerator::new(storage.clone()),
            config: Arc::new(config),
            storage,
            listeners: Vec::new(),
            presigned_ttl: DEFAULT_PRESIGNED_URL_TTL,
        })
    }

    pub fn with_filename_strategy(mut self, strategy: FilenameStrategy) -> Self {
        self.filename = strategy;
        self
    }

    pub fn with_listener(mut self, listener: impl UploadListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn with_presigned_ttl(mut self, ttl: Duration) -> Self {
        self.presigned_ttl = ttl;
        self
    }

    /// Directory for variation scratch files
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.variants = self.variants.with_scratch_dir(dir);
        self
    }

    pub fn config(&self) -> &AttachmentConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Coordinator for one save or delete cycle of one record
    pub fn coordinator(&self) -> LifecycleCoordinator {
        LifecycleCoordinator::new(self.clone())
    }

    pub(crate) fn filename_strategy(&self) -> &FilenameStrategy {
        &self.filename
    }

    pub(crate) fn listeners(&self) -> &[Arc<dyn UploadListener>] {
        &self.listeners
    }

    pub(crate) fn variants(&self) -> &VariantGenerator {
        &self.variants
    }

    /// Key of the record's object, from its in-memory value or, with
    /// `use_old`, from its persisted value. `None` when no file is attached.
    pub fn resolve_key<R: Record + ?Sized>(
        &self,
        record: &R,
        use_old: bool,
    ) -> AppResult<Option<String>> {
        PathResolver::resolve(&self.config.target(), record, use_old)
    }

    /// Key of a variation stored next to `base_key`
    pub fn variation_key_for(&self, base_key: &str, profile: &str) -> String {
        match base_key.rsplit_once('/') {
            Some((dir, filename)) => format!("{}/{}", dir, variation_filename(filename, profile)),
            None => variation_filename(base_key, profile),
        }
    }

    /// Base key followed by every configured variation key
    pub(crate) fn object_keys<R: Record + ?Sized>(
        &self,
        record: &R,
        use_old: bool,
    ) -> AppResult<Vec<String>> {
        let Some(key) = self.resolve_key(record, use_old)? else {
            return Ok(Vec::new());
        };
        let mut keys: Vec<String> = self
            .config
            .variations
            .keys()
            .map(|profile| self.variation_key_for(&key, profile))
            .collect();
        keys.insert(0, key);
        Ok(keys)
    }

    pub(crate) fn object_metadata(&self, original_name: Option<&str>) -> ObjectMetadata {
        let mut metadata: ObjectMetadata = self.config.metadata.clone();
        if let Some(name) = original_name {
            metadata.insert(ORIGINAL_FILENAME_METADATA_KEY.to_string(), name.to_string());
        }
        metadata.insert(
            UPLOADED_AT_METADATA_KEY.to_string(),
            chrono::Utc::now().to_rfc3339(),
        );
        metadata
    }

    fn variation_spec(&self, profile: &str) -> AppResult<&VariationSpec> {
        self.config.variations.get(profile).ok_or_else(|| {
            AppError::InvalidVariationSpec(format!(
                "Unknown variation profile '{}' for attribute {}",
                profile, self.config.attribute
            ))
        })
    }

    /// Key of the stored (persisted) file
    pub fn upload_key<R: Record + ?Sized>(&self, record: &R) -> AppResult<Option<String>> {
        self.resolve_key(record, true)
    }

    /// Bucket and key of the stored file
    pub fn stored_file<R: Record + ?Sized>(
        &self,
        record: &R,
    ) -> AppResult<Option<StoredFileReference>> {
        Ok(self.upload_key(record)?.map(|key| StoredFileReference {
            bucket: self.config.bucket.clone(),
            key,
        }))
    }

    /// Public URL of the stored file
    pub fn upload_url<R: Record + ?Sized>(&self, record: &R) -> AppResult<Option<String>> {
        Ok(self
            .stored_file(record)?
            .map(|file| self.storage.public_url(&file.bucket, &file.key)))
    }

    /// Time-limited URL of the stored file
    pub async fn presigned_url<R: Record + ?Sized>(&self, record: &R) -> AppResult<Option<String>> {
        let Some(key) = self.upload_key(record)? else {
            return Ok(None);
        };
        let url = self
            .storage
            .presigned_url(&self.config.bucket, &key, self.presigned_ttl)
            .await?;
        Ok(Some(url))
    }

    pub fn variation_key<R: Record + ?Sized>(
        &self,
        record: &R,
        profile: &str,
    ) -> AppResult<Option<String>> {
        self.variation_spec(profile)?;
        Ok(self
            .upload_key(record)?
            .map(|key| self.variation_key_for(&key, profile)))
    }

    /// Public URL of a variation.
    ///
    /// With `create_variations_on_access`, a missing variation is generated
    /// from the stored file before the URL is returned.
    pub async fn variation_url<R: Record + ?Sized>(
        &self,
        record: &R,
        profile: &str,
    ) -> AppResult<Option<String>> {
        let spec = self.variation_spec(profile)?;
        let Some(base_key) = self.upload_key(record)? else {
            return Ok(None);
        };
        let key = self.variation_key_for(&base_key, profile);
        let bucket = &self.config.bucket;

        if self.config.create_variations_on_access && !self.storage.exists(bucket, &key).await? {
            self.create_variation_from_stored(&base_key, spec, &key)
                .await?;
        }

        Ok(Some(self.storage.public_url(bucket, &key)))
    }

    async fn create_variation_from_stored(
        &self,
        base_key: &str,
        spec: &VariationSpec,
        key: &str,
    ) -> AppResult<()> {
        let bucket = &self.config.bucket;
        let start = std::time::Instant::now();

        let data = self.storage.download(bucket, base_key).await?;
        let source = tempfile::Builder::new()
            .prefix("stowage-source-")
            .tempfile()?;
        fs::write(source.path(), &data).await?;

        self.variants
            .generate(source.path(), spec, bucket, key, &self.object_metadata(None))
            .await?;

        tracing::info!(
            attribute = %self.config.attribute,
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Variation created on access"
        );
        Ok(())
    }

    /// Whether an object exists for the stored file
    pub async fn exists<R: Record + ?Sized>(&self, record: &R) -> AppResult<bool> {
        match self.stored_file(record)? {
            Some(file) => Ok(self.storage.exists(&file.bucket, &file.key).await?),
            None => Ok(false),
        }
    }

    /// True when no object is stored under `filename` in the record's base path
    pub async fn is_filename_unique<R: Record + ?Sized>(
        &self,
        record: &R,
        filename: &str,
    ) -> AppResult<bool> {
        let base = PathResolver::resolve_template(&self.config.path_template, record, false)?;
        let key = PathResolver::join(&base, filename);
        Ok(!self.storage.exists(&self.config.bucket, &key).await?)
    }
}
