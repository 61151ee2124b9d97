//! After-upload notification
//!
//! Listeners are registered on the [`crate::AttachmentBehavior`] and called
//! synchronously, in registration order, once per completed save cycle.

use crate::record::Record;

/// What was stored by one save cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEvent {
    pub attribute: String,
    pub bucket: String,
    /// Key of the uploaded base object
    pub key: String,
    pub filename: String,
    /// Keys of the variations produced during the same cycle
    pub variation_keys: Vec<String>,
}

/// Trait for collaborators reacting to completed uploads (cache invalidation,
/// search indexing and the like).
pub trait UploadListener: Send + Sync {
    fn after_upload(&self, record: &dyn Record, event: &UploadEvent);
}

impl<F> UploadListener for F
where
    F: Fn(&dyn Record, &UploadEvent) + Send + Sync,
{
    fn after_upload(&self, record: &dyn Record, event: &UploadEvent) {
        self(record, event)
    }
}
