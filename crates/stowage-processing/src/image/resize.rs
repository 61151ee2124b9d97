use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};
use stowage_core::{AppError, AppResult, ThumbnailMode, VariationSpec};

/// Thumbnail operations backing variation profiles
pub struct ThumbnailResize;

impl ThumbnailResize {
    /// Fill in the missing side of the target box from the source aspect ratio.
    ///
    /// The computed side is rounded up so the box never ends up a pixel short.
    pub fn complete_dimensions(
        orig_width: u32,
        orig_height: u32,
        width: Option<u32>,
        height: Option<u32>,
    ) -> AppResult<(u32, u32)> {
        if orig_width == 0 || orig_height == 0 {
            return Err(AppError::ImageProcessing(
                "Source image has no pixels".to_string(),
            ));
        }

        match (width, height) {
            (Some(w), Some(h)) => Ok((w, h)),
            (Some(w), None) => {
                let h = (w as u64 * orig_height as u64).div_ceil(orig_width as u64);
                Ok((w, (h as u32).max(1)))
            }
            (None, Some(h)) => {
                let w = (h as u64 * orig_width as u64).div_ceil(orig_height as u64);
                Ok(((w as u32).max(1), h))
            }
            (None, None) => Err(AppError::InvalidVariationSpec(
                "Either width or height must be set".to_string(),
            )),
        }
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> imageops::FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            imageops::FilterType::Triangle
        } else if max_ratio > 1.5 {
            imageops::FilterType::CatmullRom
        } else {
            imageops::FilterType::Lanczos3
        }
    }

    /// Fit the image inside the box without upscaling and centre it on a
    /// canvas of exactly the box size.
    pub fn inset(
        img: &DynamicImage,
        target_width: u32,
        target_height: u32,
        background: [u8; 3],
    ) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();

        let scale_width = target_width as f32 / orig_width as f32;
        let scale_height = target_height as f32 / orig_height as f32;
        let scale = scale_width.min(scale_height).min(1.0);

        let scaled_width = ((orig_width as f32 * scale).round() as u32).clamp(1, target_width);
        let scaled_height = ((orig_height as f32 * scale).round() as u32).clamp(1, target_height);

        let [r, g, b] = background;
        let canvas_img = RgbaImage::from_pixel(target_width, target_height, Rgba([r, g, b, 255]));
        let mut canvas = DynamicImage::ImageRgba8(canvas_img);

        let x_offset = (target_width - scaled_width) / 2;
        let y_offset = (target_height - scaled_height) / 2;

        if scale < 1.0 {
            let filter = Self::select_filter(orig_width, orig_height, scaled_width, scaled_height);
            let resized = img.resize_exact(scaled_width, scaled_height, filter);
            imageops::overlay(&mut canvas, &resized, x_offset as i64, y_offset as i64);
        } else {
            imageops::overlay(&mut canvas, img, x_offset as i64, y_offset as i64);
        }

        canvas
    }

    /// Scale the image to cover the box and crop the overflow around the centre.
    pub fn outset(img: &DynamicImage, target_width: u32, target_height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let filter = Self::select_filter(orig_width, orig_height, target_width, target_height);
        img.resize_to_fill(target_width, target_height, filter)
    }

    /// Produce the thumbnail described by a variation profile
    pub fn thumbnail(img: &DynamicImage, spec: &VariationSpec) -> AppResult<DynamicImage> {
        spec.validate()?;
        let (orig_width, orig_height) = img.dimensions();
        let (width, height) =
            Self::complete_dimensions(orig_width, orig_height, spec.width, spec.height)?;

        tracing::debug!(
            orig_width,
            orig_height,
            width,
            height,
            mode = ?spec.mode,
            "Creating thumbnail"
        );

        Ok(match spec.mode {
            ThumbnailMode::Inset => Self::inset(img, width, height, spec.background_rgb()?),
            ThumbnailMode::Outset => Self::outset(img, width, height),
        })
    }
}
