use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use stowage_core::{AppError, AppResult};

use crate::image::image_error;

/// Output format for variation images, chosen by the destination extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl OutputFormat {
    pub fn from_extension(ext: &str) -> AppResult<Self> {
        match ext.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "gif" => Ok(OutputFormat::Gif),
            "webp" => Ok(OutputFormat::WebP),
            other => Err(AppError::ImageProcessing(format!(
                "Unsupported variation format: {:?}",
                other
            ))),
        }
    }

    /// Format of the object stored under `key`
    pub fn from_key(key: &str) -> AppResult<Self> {
        let filename = key.rsplit('/').next().unwrap_or(key);
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Err(AppError::ImageProcessing(format!(
                "Cannot infer image format of {}",
                key
            ))),
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn to_image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::WebP => ImageFormat::WebP,
        }
    }
}

/// Encode an image. `quality` only affects JPEG output; the other formats are
/// written losslessly.
pub fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> AppResult<Vec<u8>> {
    let (width, height) = (img.width(), img.height());
    let mut buffer = Vec::with_capacity((width * height * 3) as usize);

    match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
            rgb.write_with_encoder(encoder).map_err(image_error)?;
        }
        other => {
            let mut cursor = Cursor::new(&mut buffer);
            img.write_to(&mut cursor, other.to_image_format())
                .map_err(image_error)?;
        }
    }

    Ok(buffer)
}
