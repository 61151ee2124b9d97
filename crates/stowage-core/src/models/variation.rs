use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{DEFAULT_BACKGROUND_COLOR, DEFAULT_VARIATION_QUALITY};
use crate::error::{AppError, AppResult};

/// How a source image is fitted into the variation's box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailMode {
    /// Fit inside the box, padding the remainder with the background colour
    #[default]
    Inset,
    /// Cover the whole box, cropping what overflows
    #[serde(alias = "outbound")]
    Outset,
}

/// Declarative description of one named image variation.
///
/// The profile name ("thumb", "medium", ...) is the key under which the spec is
/// registered in [`crate::AttachmentConfig::variations`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationSpec {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub mode: ThumbnailMode,
    #[serde(default = "default_background_color", alias = "bg_color")]
    pub background_color: String,
}

fn default_quality() -> u8 {
    DEFAULT_VARIATION_QUALITY
}

fn default_background_color() -> String {
    DEFAULT_BACKGROUND_COLOR.to_string()
}

impl Default for VariationSpec {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            quality: DEFAULT_VARIATION_QUALITY,
            mode: ThumbnailMode::default(),
            background_color: default_background_color(),
        }
    }
}

impl VariationSpec {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: ThumbnailMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    /// Check the spec can drive a resize.
    pub fn validate(&self) -> AppResult<()> {
        if self.width.is_none() && self.height.is_none() {
            return Err(AppError::InvalidVariationSpec(
                "At least one of width or height must be specified".to_string(),
            ));
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(AppError::InvalidVariationSpec(
                "Width and height must be greater than zero".to_string(),
            ));
        }
        if self.quality > 100 {
            return Err(AppError::InvalidVariationSpec(format!(
                "Quality must be between 0 and 100, got {}",
                self.quality
            )));
        }
        self.background_rgb()?;
        Ok(())
    }

    /// Parse `background_color` (`RGB` or `RRGGBB`, optional leading `#`).
    pub fn background_rgb(&self) -> AppResult<[u8; 3]> {
        let hex = self.background_color.trim().trim_start_matches('#');
        let invalid = || {
            AppError::InvalidVariationSpec(format!(
                "Invalid background color: {}",
                self.background_color
            ))
        };

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(invalid()),
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        Ok([channel(0)?, channel(2)?, channel(4)?])
    }
}

/// Name of a variation stored next to `filename`: `{stem}-{profile}.{ext}`.
pub fn variation_filename(filename: &str, profile: &str) -> String {
    let path = Path::new(filename);
    match (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|e| e.to_str()),
    ) {
        (Some(stem), Some(ext)) => format!("{}-{}.{}", stem, profile, ext),
        _ => format!("{}-{}", filename, profile),
    }
}
