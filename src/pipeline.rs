//! End-to-end gallery build.
//!
//! ```text
//! resolve config ─► prepare folders ─► gather ALL dimensions
//!     ─► layout (pure) ─► resize jobs on the worker pool ─► manifest
//! ```
//!
//! Layout only starts once every dimension is known. Resize jobs are
//! independent of each other and finish in any order.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::task;
use tracing::{info, warn};

use crate::config::{GalleryConfig, ImageEntry, ResolvedConfig};
use crate::layout::layout_gallery;
use crate::models::{Gallery, PlacedImage, Row};
use crate::scanner::FileScanner;
use crate::thumbnails::{default_workers, ResizeOutcome, ResizeRequest, ThumbnailQueue};

/// Keys the manifest writes for every image; same-named pass-through fields are dropped.
const RESERVED_IMAGE_KEYS: &[&str] = &["filename", "metadata", "scaleFactor", "width", "height"];

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Resize worker threads.
    pub workers: usize,
    /// Compute the layout without writing thumbnails.
    pub skip_thumbnails: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            skip_thumbnails: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestImage {
    pub filename: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Intrinsic size of the source image.
    pub metadata: Dimensions,
    pub scale_factor: f64,
    /// Render width.
    pub width: u32,
    /// Render height.
    pub height: u32,
}

impl ManifestImage {
    fn new(entry: &ImageEntry, placed: &PlacedImage) -> Self {
        let mut extra = entry.extra.clone();
        extra.retain(|key, _| !RESERVED_IMAGE_KEYS.contains(&key.as_str()));
        Self {
            filename: placed.filename().to_string(),
            extra,
            metadata: Dimensions {
                width: placed.source.width as u32,
                height: placed.source.height as u32,
            },
            scale_factor: placed.scale_factor,
            width: placed.render_width,
            height: placed.render_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestRow {
    pub height: f64,
    pub width: f64,
    pub images: Vec<ManifestImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestGallery {
    pub rows: Vec<ManifestRow>,
}

/// The build result handed to a renderer: the configuration without its
/// image list, the resolved folders and the laid-out gallery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryManifest {
    #[serde(flatten)]
    pub settings: GalleryConfig,
    pub images_folder_full_path: PathBuf,
    pub thumbs_folder_full_path: PathBuf,
    pub gallery: ManifestGallery,
}

impl GalleryManifest {
    fn new(resolved: &ResolvedConfig, gallery: &Gallery, entries: &[ImageEntry]) -> Self {
        let mut entries = entries.iter();
        let rows = gallery
            .rows
            .iter()
            .map(|row: &Row| ManifestRow {
                height: row.height,
                width: row.width,
                images: row
                    .images
                    .iter()
                    .zip(entries.by_ref())
                    .map(|(placed, entry)| ManifestImage::new(entry, placed))
                    .collect(),
            })
            .collect();

        Self {
            settings: resolved.settings.clone(),
            images_folder_full_path: resolved.images_dir.clone(),
            thumbs_folder_full_path: resolved.thumbs_dir.clone(),
            gallery: ManifestGallery { rows },
        }
    }
}

#[derive(Debug, Clone)]
pub struct GalleryBuild {
    pub manifest: GalleryManifest,
    pub gallery: Gallery,
    /// Resize jobs that failed. The layout is still complete.
    pub failures: Vec<ResizeOutcome>,
}

/// Builds a gallery: lays out every image and writes its resized copy.
///
/// `context` is the directory the config's folders are relative to.
/// Invalid configuration fails before anything touches the disk.
pub async fn build_gallery(
    config: &GalleryConfig,
    context: &Path,
    options: &BuildOptions,
) -> Result<GalleryBuild> {
    let resolved = config.resolve(context)?;
    prepare_folders(&resolved)?;

    let entries = match &resolved.images {
        Some(list) => list.clone(),
        None => FileScanner::new()
            .discover(&resolved.images_dir)?
            .into_iter()
            .map(ImageEntry::new)
            .collect(),
    };
    let filenames: Vec<String> = entries.iter().map(|e| e.filename.clone()).collect();
    info!("Reading dimensions of {} images", filenames.len());

    let descriptors = FileScanner::gather(&resolved.images_dir, &filenames).await?;
    let gallery = layout_gallery(&descriptors, resolved.layout)?;
    info!(
        "Laid out {} images in {} rows",
        gallery.image_count(),
        gallery.rows.len()
    );

    let failures = if options.skip_thumbnails {
        Vec::new()
    } else {
        write_thumbnails(&resolved, &gallery, options.workers).await?
    };

    Ok(GalleryBuild {
        manifest: GalleryManifest::new(&resolved, &gallery, &entries),
        gallery,
        failures,
    })
}

fn prepare_folders(resolved: &ResolvedConfig) -> Result<()> {
    for dir in [&resolved.images_dir, &resolved.thumbs_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create folder: {:?}", dir))?;
    }
    Ok(())
}

async fn write_thumbnails(
    resolved: &ResolvedConfig,
    gallery: &Gallery,
    workers: usize,
) -> Result<Vec<ResizeOutcome>> {
    let requests: Vec<ResizeRequest> = gallery
        .images()
        .map(|placed| ResizeRequest {
            src: resolved.images_dir.join(placed.filename()),
            dst: resolved.thumbs_dir.join(placed.filename()),
            width: placed.render_width,
            height: placed.render_height,
        })
        .collect();
    // A filename listed twice shares one destination; the queue keeps the
    // first request for it, so the earliest row decides the thumbnail size.
    info!("Writing {} thumbnails with {} workers", requests.len(), workers);

    let outcomes = task::spawn_blocking(move || ThumbnailQueue::run(workers, requests))
        .await
        .context("Thumbnail task panicked")??;

    let failures: Vec<ResizeOutcome> = outcomes.into_iter().filter(|o| !o.is_ok()).collect();
    if !failures.is_empty() {
        warn!("{} thumbnails failed", failures.len());
    }
    Ok(failures)
}
