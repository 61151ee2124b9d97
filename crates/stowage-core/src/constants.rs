//! Shared defaults.

use std::time::Duration;

/// Region used when neither `S3_REGION` nor `AWS_REGION` is set.
pub const DEFAULT_S3_REGION: &str = "us-east-2";

/// Lifetime of presigned URLs when the caller does not pass one.
pub const DEFAULT_PRESIGNED_URL_TTL: Duration = Duration::from_secs(600);

/// Encoding quality for variations that do not set one.
pub const DEFAULT_VARIATION_QUALITY: u8 = 100;

/// Canvas colour behind inset thumbnails.
pub const DEFAULT_BACKGROUND_COLOR: &str = "FFF";

/// Characters replaced by `-` when a filename is sanitized.
pub const UNSAFE_FILENAME_CHARS: [char; 8] = [' ', '"', '\'', '&', '/', '\\', '?', '#'];

/// Metadata key carrying the client-side name of an uploaded file.
pub const ORIGINAL_FILENAME_METADATA_KEY: &str = "original-filename";

/// Metadata key carrying the upload time (RFC 3339)
pub const UPLOADED_AT_METADATA_KEY: &str = "uploaded-at";
