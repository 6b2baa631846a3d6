//! Thumbnail generation using the image crate.
//!
//! Resizes a source image to the exact size the layout computed and writes it
//! in the format implied by the destination extension.

use std::path::Path;

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

/// JPEG quality for thumbnail encoding (0-100).
const JPEG_QUALITY: u8 = 85;

/// Thumbnail generator that writes resized copies of gallery images.
pub struct ThumbnailGenerator;

impl ThumbnailGenerator {
    /// Resize `src` to exactly `width` x `height` and save it to `dst`.
    ///
    /// The destination's parent directory is created if missing.
    pub fn generate(src: &Path, dst: &Path, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            bail!("Refusing to write empty thumbnail {width}x{height}: {:?}", dst);
        }
        debug!(?src, ?dst, width, height, "Generating thumbnail");

        let img = Self::load_image(src)?;

        // CatmullRom provides good quality/speed balance for downscaling
        let thumbnail = img.resize_exact(width, height, FilterType::CatmullRom);

        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create thumbnail directory: {:?}", parent))?;
        }

        Self::save_thumbnail(&thumbnail, dst)
    }

    fn load_image(path: &Path) -> Result<DynamicImage> {
        image::ImageReader::open(path)
            .with_context(|| format!("Failed to open image: {:?}", path))?
            .with_guessed_format()
            .with_context(|| format!("Failed to guess image format: {:?}", path))?
            .decode()
            .with_context(|| format!("Failed to load image: {:?}", path))
    }

    /// Determine image format from file extension.
    fn format_from_extension(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::WebP),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            "tiff" | "tif" => Some(ImageFormat::Tiff),
            _ => None,
        }
    }

    /// Save under the same format the filename names; JPEG gets a fixed quality.
    fn save_thumbnail(img: &DynamicImage, dst: &Path) -> Result<()> {
        use image::codecs::jpeg::JpegEncoder;
        use std::fs::File;
        use std::io::BufWriter;

        let format = Self::format_from_extension(dst)
            .with_context(|| format!("Unsupported thumbnail format: {:?}", dst))?;

        if format == ImageFormat::Jpeg {
            let file = File::create(dst)
                .with_context(|| format!("Failed to create thumbnail file: {:?}", dst))?;
            let mut writer = BufWriter::new(file);

            // JPEG has no alpha channel
            let rgb_img = img.to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            rgb_img
                .write_with_encoder(encoder)
                .with_context(|| format!("Failed to encode thumbnail: {:?}", dst))?;
        } else {
            // The pure-Rust WebP encoder is lossless-only and expects 8-bit RGB(A).
            let img = match format {
                ImageFormat::WebP => DynamicImage::ImageRgba8(img.to_rgba8()),
                _ => img.clone(),
            };
            img.save_with_format(dst, format)
                .with_context(|| format!("Failed to encode thumbnail: {:?}", dst))?;
        }

        debug!(?dst, "Saved thumbnail");
        Ok(())
    }
}
