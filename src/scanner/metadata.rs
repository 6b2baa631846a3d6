//! Dimension reads for source images.
//!
//! Only the header is decoded, so reading dimensions stays cheap even for
//! large photographs.

use std::path::Path;

use anyhow::{Context, Result};
use image::ImageReader;
use tracing::trace;

use crate::models::ImageDescriptor;

/// Reads intrinsic image dimensions from disk.
pub struct MetadataReader;

impl MetadataReader {
    /// Reads `(width, height)` from the image header.
    ///
    /// The format is guessed from the file contents, not the extension.
    /// Unreadable or unrecognized files are errors: layout cannot start
    /// without every image's size.
    pub fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
        trace!("Reading image dimensions from {:?}", path);

        let reader = ImageReader::open(path)
            .with_context(|| format!("Failed to open image: {:?}", path))?
            .with_guessed_format()
            .with_context(|| format!("Failed to guess image format: {:?}", path))?;
        let (width, height) = reader
            .into_dimensions()
            .with_context(|| format!("Failed to read dimensions: {:?}", path))?;

        trace!("Got dimensions {}x{} for {:?}", width, height, path);
        Ok((width, height))
    }

    /// Builds a layout descriptor for `filename` inside `dir`.
    pub fn describe(dir: &Path, filename: &str) -> Result<ImageDescriptor> {
        let (width, height) = Self::read_dimensions(&dir.join(filename))?;
        Ok(ImageDescriptor::from_pixels(filename, width, height))
    }
}
