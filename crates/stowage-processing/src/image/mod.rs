//! Image transformations used by variation profiles

pub mod resize;

pub use resize::ThumbnailResize;

use stowage_core::AppError;

pub(crate) fn image_error(err: ::image::ImageError) -> AppError {
    AppError::ImageProcessing(err.to_string())
}
