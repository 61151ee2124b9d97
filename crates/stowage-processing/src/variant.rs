//! Variation generation
//!
//! A variation is decoded and resized on a blocking thread, written to a
//! private scratch file and then uploaded. The scratch file is a
//! [`tempfile::NamedTempFile`], so it is removed when the generator returns,
//! whatever the outcome of the upload.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use stowage_core::{AppError, AppResult, VariationSpec};
use stowage_storage::{ObjectMetadata, Storage};
use tempfile::NamedTempFile;

use crate::compression::{encode, OutputFormat};
use crate::image::{image_error, ThumbnailResize};

#[derive(Clone)]
pub struct VariantGenerator {
    storage: Arc<dyn Storage>,
    scratch_dir: Option<PathBuf>,
}

impl VariantGenerator {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            scratch_dir: None,
        }
    }

    /// Write scratch files below `dir` instead of the system temp directory
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Resize `source` according to `spec` and upload the result to
    /// `bucket`/`key`. The output format follows the extension of `key`.
    pub async fn generate(
        &self,
        source: &Path,
        spec: &VariationSpec,
        bucket: &str,
        key: &str,
        metadata: &ObjectMetadata,
    ) -> AppResult<()> {
        spec.validate()?;
        let format = OutputFormat::from_key(key)?;

        let scratch = self.render(source, spec, format).await?;

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            content_type = format.to_mime_type(),
            "Uploading variation"
        );

        self.storage
            .put_file(bucket, key, scratch.path(), metadata)
            .await?;

        tracing::info!(bucket = %bucket, key = %key, "Variation created");
        Ok(())
    }

    async fn render(
        &self,
        source: &Path,
        spec: &VariationSpec,
        format: OutputFormat,
    ) -> AppResult<NamedTempFile> {
        let source = source.to_path_buf();
        let spec = spec.clone();
        let scratch_dir = self.scratch_dir.clone();

        tokio::task::spawn_blocking(move || -> AppResult<NamedTempFile> {
            let img = image::ImageReader::open(&source)?
                .with_guessed_format()?
                .decode()
                .map_err(image_error)?;

            let thumbnail = ThumbnailResize::thumbnail(&img, &spec)?;
            let data = encode(&thumbnail, format, spec.quality)?;

            let mut builder = tempfile::Builder::new();
            builder.prefix("stowage-variation-");
            let mut scratch = match scratch_dir {
                Some(dir) => builder.tempfile_in(dir)?,
                None => builder.tempfile()?,
            };
            scratch.write_all(&data)?;
            scratch.flush()?;
            Ok(scratch)
        })
        .await
        .map_err(|e| AppError::ImageProcessing(format!("Variation task failed: {}", e)))?
    }
}
