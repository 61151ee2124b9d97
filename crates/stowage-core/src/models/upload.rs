use std::path::{Path, PathBuf};

/// A file received from a client, waiting in a temporary location until the
/// owning record has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Where the payload currently lives on local disk.
    pub temp_path: PathBuf,
    /// Name supplied by the client, unsanitized.
    pub name: String,
    /// Lowercase extension of `name`, without the dot. Empty when absent.
    pub extension: String,
    pub content_type: Option<String>,
}

impl UploadedFile {
    pub fn new(temp_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        let name = name.into();
        let extension = Path::new(&name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        Self {
            temp_path: temp_path.into(),
            name,
            extension,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}
