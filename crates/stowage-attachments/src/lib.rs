//! Stowage Attachments
//!
//! Binds a record's persistence lifecycle to object storage: a file attached
//! to a record attribute is uploaded once the record has been saved, the
//! previous object is removed when the file is replaced, and every object
//! (variations included) is removed when the record is deleted.
//!
//! ```ignore
//! let behavior = AttachmentBehavior::new(config, storage)?;
//!
//! let mut lifecycle = behavior.coordinator();
//! lifecycle.before_validate(&mut record, Some(file))?;
//! lifecycle.before_save(&mut record)?;
//! match repository.save(&record).await {
//!     Ok(()) => {
//!         let report = lifecycle.after_save(&record).await?;
//!     }
//!     Err(e) => lifecycle.abort(),
//! }
//! ```

pub mod behavior;
pub mod coordinator;
pub mod filename;
pub mod listener;
pub mod path;
pub mod record;

pub use behavior::AttachmentBehavior;
pub use coordinator::{
    CleanupFailure, CleanupOperation, DeleteReport, LifecycleCoordinator, LifecycleState,
    SaveReport,
};
pub use filename::FilenameStrategy;
pub use listener::{UploadEvent, UploadListener};
pub use path::PathResolver;
pub use record::Record;
