//! Image variation engine
//!
//! Resizes uploaded images into the configured thumbnail profiles and uploads
//! each result through the injected [`stowage_storage::Storage`].

pub mod compression;
pub mod image;
pub mod variant;

pub use compression::OutputFormat;
pub use image::ThumbnailResize;
pub use variant::VariantGenerator;
