use std::path::Path;

use serde::{Deserialize, Serialize};

/// Extensions the gallery treats as images.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif"];

/// Returns true if the path carries an image extension (case-insensitive).
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// An input image: an opaque filename plus its intrinsic pixel size.
///
/// Sizes are floating point so that malformed input (NaN, infinities) can be
/// represented and rejected by the layout engine instead of being divided by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub filename: String,
    pub width: f64,
    pub height: f64,
}

impl ImageDescriptor {
    pub fn new(filename: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            filename: filename.into(),
            width,
            height,
        }
    }

    /// Create a descriptor from integer pixel dimensions as read from a file header.
    pub fn from_pixels(filename: impl Into<String>, width: u32, height: u32) -> Self {
        Self::new(filename, width as f64, height as f64)
    }

    /// Check that both dimensions are finite and strictly positive.
    pub fn has_valid_size(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}
