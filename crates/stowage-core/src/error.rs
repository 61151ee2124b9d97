//! Error types module
//!
//! All failures surfaced by the attachment layer are unified under `AppError`.
//! Setup problems (`Configuration`) are raised while wiring the application and
//! never during a live save or delete. Bad input (`InvalidFilename`,
//! `InvalidVariationSpec`, `UnresolvedPlaceholder`) fails the triggering call only.
//! Storage failures keep the not-found signal apart from transport/auth failures
//! so callers can treat absence as benign.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like bad input
    Debug,
    /// Warning level - for benign or recoverable conditions
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Self-description of an error for callers that report or retry.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORAGE_TRANSPORT_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether repeating the same call may succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Invalid variation spec: {0}")]
    InvalidVariationSpec(String),

    #[error("Path template '{template}' references unknown attribute '{placeholder}'")]
    UnresolvedPlaceholder {
        template: String,
        placeholder: String,
    },

    #[error("Storage transport error: {0}")]
    StorageTransport(String),

    #[error("Object not found: {0}")]
    StorageNotFound(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for attachment operations
pub type AppResult<T> = Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Configuration(format!("JSON parsing error: {}", err))
    }
}

impl AppError {
    /// True when the error only says the object is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::StorageNotFound(_))
    }
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn app_error_static_metadata(err: &AppError) -> (&'static str, bool, LogLevel) {
    match err {
        AppError::Configuration(_) => ("CONFIGURATION_ERROR", false, LogLevel::Error),
        AppError::InvalidFilename(_) => ("INVALID_FILENAME", false, LogLevel::Debug),
        AppError::InvalidVariationSpec(_) => ("INVALID_VARIATION_SPEC", false, LogLevel::Debug),
        AppError::UnresolvedPlaceholder { .. } => {
            ("UNRESOLVED_PLACEHOLDER", false, LogLevel::Debug)
        }
        AppError::StorageTransport(_) => ("STORAGE_TRANSPORT_ERROR", true, LogLevel::Error),
        AppError::StorageNotFound(_) => ("STORAGE_NOT_FOUND", false, LogLevel::Warn),
        AppError::ImageProcessing(_) => ("IMAGE_PROCESSING_ERROR", false, LogLevel::Warn),
        AppError::Io(_) => ("IO_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).2
    }
}
