//! Save/delete lifecycle of one managed attribute
//!
//! ```text
//! Idle -> PendingFile -> Committing -> Uploaded -> Done
//! Idle -> Deleting -> Deleted
//! ```
//!
//! A file attached in `before_validate` stays local until the record has been
//! persisted; `abort` drops it without touching storage. Removing replaced
//! objects and producing variations are best-effort: their failures are
//! collected in the returned report. Only the primary object operation can
//! fail a cycle.

use std::fmt;

use stowage_core::{AppError, AppResult, UploadedFile};
use stowage_storage::StorageError;
use tokio::fs;

use crate::behavior::AttachmentBehavior;
use crate::listener::UploadEvent;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    PendingFile,
    Committing,
    Uploaded,
    Done,
    Deleting,
    Deleted,
}

/// Secondary operation whose failure does not fail the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOperation {
    DeleteReplaced,
    GenerateVariation,
    DeleteOriginal,
    DeleteTempFile,
    DeleteVariation,
}

impl fmt::Display for CleanupOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CleanupOperation::DeleteReplaced => "delete_replaced",
            CleanupOperation::GenerateVariation => "generate_variation",
            CleanupOperation::DeleteOriginal => "delete_original",
            CleanupOperation::DeleteTempFile => "delete_temp_file",
            CleanupOperation::DeleteVariation => "delete_variation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub key: String,
    pub operation: CleanupOperation,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Key of the uploaded object; `None` when no file was attached
    pub key: Option<String>,
    pub variation_keys: Vec<String>,
    pub failures: Vec<CleanupFailure>,
}

impl SaveReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    /// Keys that were already absent
    pub not_found: Vec<String>,
    pub failures: Vec<CleanupFailure>,
}

impl DeleteReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

fn cleanup_failure(
    attribute: &str,
    key: &str,
    operation: CleanupOperation,
    error: impl fmt::Display,
) -> CleanupFailure {
    let message = error.to_string();
    tracing::warn!(
        attribute = %attribute,
        key = %key,
        operation = %operation,
        error = %message,
        "Attachment cleanup failed"
    );
    CleanupFailure {
        key: key.to_string(),
        operation,
        message,
    }
}

#[derive(Debug)]
struct PendingUpload {
    file: UploadedFile,
    filename: String,
    /// Objects of the persisted value, removed once the record is saved
    replaced: Vec<String>,
}

pub struct LifecycleCoordinator {
    behavior: AttachmentBehavior,
    state: LifecycleState,
    pending: Option<PendingUpload>,
}

impl LifecycleCoordinator {
    pub(crate) fn new(behavior: AttachmentBehavior) -> Self {
        Self {
            behavior,
            state: LifecycleState::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn has_pending_file(&self) -> bool {
        self.pending.is_some()
    }

    /// Attach `file` to the record. The attribute is rewritten to the stored
    /// filename so validation sees the final value.
    pub fn before_validate<R: Record + ?Sized>(
        &mut self,
        record: &mut R,
        file: Option<UploadedFile>,
    ) -> AppResult<()> {
        let Some(file) = file else {
            return Ok(());
        };

        let attribute = &self.behavior.config().attribute;
        let filename = self.behavior.filename_strategy().name_for(&file)?;
        record.set_attribute(attribute, Some(filename.clone()));

        tracing::debug!(
            attribute = %attribute,
            original_name = %file.name,
            filename = %filename,
            "File attached"
        );

        self.pending = Some(PendingUpload {
            file,
            filename,
            replaced: Vec::new(),
        });
        self.state = LifecycleState::PendingFile;
        Ok(())
    }

    /// Without an attached file the persisted value is restored, so a save can
    /// never overwrite the stored filename with something else.
    pub fn before_save<R: Record + ?Sized>(&mut self, record: &mut R) -> AppResult<()> {
        let config = self.behavior.config();
        let attribute = config.attribute.as_str();

        let Some(pending) = self.pending.as_mut() else {
            let persisted = record.old_attribute(attribute);
            record.set_attribute(attribute, persisted);
            return Ok(());
        };

        record.set_attribute(attribute, Some(pending.filename.clone()));
        pending.replaced.clear();

        if config.delete_old_on_replace
            && !record.is_new_record()
            && record.is_attribute_changed(attribute)
        {
            pending.replaced = self.behavior.object_keys(record, true)?;
        }
        Ok(())
    }

    /// The record could not be persisted; forget the attached file.
    pub fn abort(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(
                attribute = %self.behavior.config().attribute,
                filename = %pending.filename,
                "Discarding pending upload"
            );
        }
        self.state = LifecycleState::Idle;
    }

    /// Upload the attached file now that the record has been persisted.
    ///
    /// Upload failures are returned as errors; everything else that goes
    /// wrong is listed in the report.
    pub async fn after_save<R: Record>(&mut self, record: &R) -> AppResult<SaveReport> {
        let Some(pending) = self.pending.take() else {
            return Ok(SaveReport::default());
        };

        self.state = LifecycleState::Committing;
        let result = self.commit(record, &pending).await;
        if result.is_err() {
            self.state = LifecycleState::Idle;
        }
        result
    }

    async fn commit<R: Record>(
        &mut self,
        record: &R,
        pending: &PendingUpload,
    ) -> AppResult<SaveReport> {
        let behavior = self.behavior.clone();
        let config = behavior.config();
        let storage = behavior.storage();
        let bucket = config.bucket.as_str();
        let attribute = config.attribute.as_str();
        let mut report = SaveReport::default();

        let key = behavior.resolve_key(record, false)?.ok_or_else(|| {
            AppError::InvalidFilename(format!("Attribute {} holds no filename", attribute))
        })?;
        let new_keys = behavior.object_keys(record, false)?;

        for old_key in pending.replaced.iter().filter(|k| !new_keys.contains(*k)) {
            match storage.delete(bucket, old_key).await {
                Ok(()) => {}
                Err(StorageError::NotFound(_)) => {
                    tracing::debug!(bucket = %bucket, key = %old_key, "Replaced object already absent");
                }
                Err(e) => report.failures.push(cleanup_failure(
                    attribute,
                    old_key,
                    CleanupOperation::DeleteReplaced,
                    e,
                )),
            }
        }

        let metadata = behavior.object_metadata(Some(&pending.file.name));
        let start = std::time::Instant::now();
        storage
            .put_file(bucket, &key, &pending.file.temp_path, &metadata)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    attribute = %attribute,
                    bucket = %bucket,
                    key = %key,
                    "Attachment upload failed"
                );
                AppError::from(e)
            })?;
        self.state = LifecycleState::Uploaded;

        tracing::info!(
            attribute = %attribute,
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Attachment uploaded"
        );

        if !config.create_variations_on_access && !config.variations.is_empty() {
            for (profile, spec) in &config.variations {
                let variation_key = behavior.variation_key_for(&key, profile);
                match behavior
                    .variants()
                    .generate(&pending.file.temp_path, spec, bucket, &variation_key, &metadata)
                    .await
                {
                    Ok(()) => report.variation_keys.push(variation_key),
                    Err(e) => report.failures.push(cleanup_failure(
                        attribute,
                        &variation_key,
                        CleanupOperation::GenerateVariation,
                        e,
                    )),
                }
            }

            // Only once every variation exists
            if config.delete_original_after_variations
                && report.variation_keys.len() == config.variations.len()
            {
                if let Err(e) = storage.delete(bucket, &key).await {
                    report.failures.push(cleanup_failure(
                        attribute,
                        &key,
                        CleanupOperation::DeleteOriginal,
                        e,
                    ));
                }
            }
        }

        if config.delete_temp_file {
            let temp_path = &pending.file.temp_path;
            match fs::remove_file(temp_path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => report.failures.push(cleanup_failure(
                    attribute,
                    &temp_path.display().to_string(),
                    CleanupOperation::DeleteTempFile,
                    e,
                )),
            }
        }

        let event = UploadEvent {
            attribute: attribute.to_string(),
            bucket: bucket.to_string(),
            key: key.clone(),
            filename: pending.filename.clone(),
            variation_keys: report.variation_keys.clone(),
        };
        for listener in behavior.listeners() {
            listener.after_upload(record, &event);
        }

        report.key = Some(key);
        self.state = LifecycleState::Done;
        Ok(report)
    }

    /// Remove the record's object and every variation of it.
    ///
    /// Objects that are already absent count as removed. A failure to remove
    /// the base object is returned as an error after all variations have been
    /// attempted.
    pub async fn after_delete<R: Record + ?Sized>(&mut self, record: &R) -> AppResult<DeleteReport> {
        let behavior = self.behavior.clone();
        let config = behavior.config();
        let mut report = DeleteReport::default();

        if !config.delete_on_record_delete {
            return Ok(report);
        }

        let keys = behavior.object_keys(record, false)?;
        self.state = LifecycleState::Deleting;

        let storage = behavior.storage();
        let bucket = config.bucket.as_str();
        let attribute = config.attribute.as_str();
        let mut base_error = None;

        for (index, key) in keys.iter().enumerate() {
            match storage.delete(bucket, key).await {
                Ok(()) => report.deleted.push(key.clone()),
                Err(StorageError::NotFound(_)) => report.not_found.push(key.clone()),
                Err(e) if index == 0 => base_error = Some(e),
                Err(e) => report.failures.push(cleanup_failure(
                    attribute,
                    key,
                    CleanupOperation::DeleteVariation,
                    e,
                )),
            }
        }

        self.state = LifecycleState::Deleted;

        if let Some(e) = base_error {
            tracing::error!(
                error = %e,
                attribute = %attribute,
                bucket = %bucket,
                key = %keys[0],
                "Attachment delete failed"
            );
            return Err(e.into());
        }

        tracing::info!(
            attribute = %attribute,
            bucket = %bucket,
            deleted = report.deleted.len(),
            not_found = report.not_found.len(),
            "Attachment objects removed"
        );
        Ok(report)
    }
}
