use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AppError, AppResult};
use crate::models::variation::VariationSpec;

/// How the stored filename is derived from the client's filename
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilenamePolicy {
    /// Keep the original name, replacing unsafe characters with `-`
    Sanitize,
    /// Replace the name with a collision-resistant one, keeping the extension
    #[default]
    Generate,
}

/// Where a record attribute's file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub bucket: String,
    pub base_path_template: String,
    pub attribute_name: String,
}

/// Resolved location of a stored object. Never persisted: records store only
/// the filename and the rest is rebuilt from configuration on access.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredFileReference {
    pub bucket: String,
    pub key: String,
}

/// Configuration of one managed record attribute.
///
/// ```json
/// {
///   "bucket": "media",
///   "path_template": "uploads/{id}",
///   "attribute": "avatar",
///   "variations": { "thumb": { "width": 120, "height": 120 } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentConfig {
    pub bucket: String,
    /// Key prefix; `{attribute}` placeholders are filled from the record.
    #[serde(default)]
    pub path_template: String,
    pub attribute: String,
    #[serde(default)]
    pub filename_policy: FilenamePolicy,
    /// Remove the previous object when an update replaces the file.
    #[serde(default = "default_true")]
    pub delete_old_on_replace: bool,
    /// Remove the object (and its variations) when the record is deleted.
    #[serde(default = "default_true")]
    pub delete_on_record_delete: bool,
    /// Remove the incoming temp file once it has been uploaded.
    #[serde(default = "default_true")]
    pub delete_temp_file: bool,
    #[serde(default)]
    pub variations: BTreeMap<String, VariationSpec>,
    /// Defer variation generation until a variation URL is first requested.
    #[serde(default)]
    pub create_variations_on_access: bool,
    /// Drop the base object once every variation has been produced.
    #[serde(default)]
    pub delete_original_after_variations: bool,
    /// Metadata attached to every uploaded object.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl AttachmentConfig {
    pub fn new(
        bucket: impl Into<String>,
        path_template: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            path_template: path_template.into(),
            attribute: attribute.into(),
            filename_policy: FilenamePolicy::default(),
            delete_old_on_replace: true,
            delete_on_record_delete: true,
            delete_temp_file: true,
            variations: BTreeMap::new(),
            create_variations_on_access: false,
            delete_original_after_variations: false,
            metadata: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str) -> AppResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_filename_policy(mut self, policy: FilenamePolicy) -> Self {
        self.filename_policy = policy;
        self
    }

    pub fn with_variation(mut self, profile: impl Into<String>, spec: VariationSpec) -> Self {
        self.variations.insert(profile.into(), spec);
        self
    }

    pub fn target(&self) -> UploadTarget {
        UploadTarget {
            bucket: self.bucket.clone(),
            base_path_template: self.path_template.clone(),
            attribute_name: self.attribute.clone(),
        }
    }

    /// Reject settings that cannot work. Called once while wiring the application.
    pub fn validate(&self) -> AppResult<()> {
        if self.attribute.trim().is_empty() {
            return Err(AppError::Configuration(
                "The \"attribute\" setting must be set".to_string(),
            ));
        }
        if self.bucket.trim().is_empty() {
            return Err(AppError::Configuration(format!(
                "The \"bucket\" setting must be set for attribute {}",
                self.attribute
            )));
        }
        for (profile, spec) in &self.variations {
            if profile.trim().is_empty() {
                return Err(AppError::Configuration(format!(
                    "Variation profile names must not be empty (attribute {})",
                    self.attribute
                )));
            }
            spec.validate().map_err(|e| {
                AppError::Configuration(format!(
                    "Variation '{}' of attribute {}: {}",
                    profile, self.attribute, e
                ))
            })?;
        }
        Ok(())
    }
}
