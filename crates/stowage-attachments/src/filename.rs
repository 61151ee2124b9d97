use std::fmt;
use std::sync::Arc;
use stowage_core::constants::UNSAFE_FILENAME_CHARS;
use stowage_core::{AppError, AppResult, FilenamePolicy, UploadedFile};
use uuid::Uuid;

/// Naming function installed in place of the built-in policies
pub type CustomNamer = Arc<dyn Fn(&UploadedFile) -> String + Send + Sync>;

/// Decides the filename an uploaded file is stored under
#[derive(Clone)]
pub enum FilenameStrategy {
    /// Keep the client's filename with unsafe characters replaced by `-`
    Sanitize,
    /// `{uuid}.{extension}`
    Generate,
    Custom(CustomNamer),
}

impl FilenameStrategy {
    pub fn custom<F>(namer: F) -> Self
    where
        F: Fn(&UploadedFile) -> String + Send + Sync + 'static,
    {
        FilenameStrategy::Custom(Arc::new(namer))
    }

    /// Stored filename for `file`
    pub fn name_for(&self, file: &UploadedFile) -> AppResult<String> {
        let name = match self {
            FilenameStrategy::Sanitize => Self::sanitize(&file.name),
            FilenameStrategy::Generate => Self::generate(&file.extension)?,
            FilenameStrategy::Custom(namer) => namer(file),
        };

        if name.trim().is_empty() {
            return Err(AppError::InvalidFilename(format!(
                "No usable filename could be derived from {:?}",
                file.name
            )));
        }
        if name.contains('/') || name == "." || name == ".." {
            return Err(AppError::InvalidFilename(format!(
                "Filename must be a single path segment: {:?}",
                name
            )));
        }
        Ok(name)
    }

    /// Replace every filesystem/URL-unsafe character with `-`
    pub fn sanitize(filename: &str) -> String {
        filename
            .chars()
            .map(|c| {
                if UNSAFE_FILENAME_CHARS.contains(&c) {
                    '-'
                } else {
                    c
                }
            })
            .collect()
    }

    pub fn generate(extension: &str) -> AppResult<String> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(AppError::InvalidFilename(
                "Cannot generate a filename for a file without extension".to_string(),
            ));
        }
        Ok(format!("{}.{}", Uuid::new_v4(), extension))
    }
}

impl Default for FilenameStrategy {
    fn default() -> Self {
        FilenamePolicy::default().into()
    }
}

impl From<FilenamePolicy> for FilenameStrategy {
    fn from(policy: FilenamePolicy) -> Self {
        match policy {
            FilenamePolicy::Sanitize => FilenameStrategy::Sanitize,
            FilenamePolicy::Generate => FilenameStrategy::Generate,
        }
    }
}

impl fmt::Debug for FilenameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilenameStrategy::Sanitize => f.write_str("Sanitize"),
            FilenameStrategy::Generate => f.write_str("Generate"),
            FilenameStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
