//! Gallery configuration.
//!
//! The configuration file is JSON. Every field is optional and falls back to
//! the defaults below; unknown fields are kept and echoed into the manifest.
//! [`GalleryConfig::resolve`] turns it into paths plus a validated
//! [`LayoutConfig`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::LayoutResult;
use crate::layout::LayoutConfig;

pub const DEFAULT_WIDTH: f64 = 960.0;
pub const DEFAULT_IMAGES_PER_ROW: i64 = 3;
pub const DEFAULT_MARGIN: f64 = 10.0;
pub const DEFAULT_IMAGES_FOLDER: &str = "images";
pub const DEFAULT_THUMBS_FOLDER: &str = "thumbs";

/// Gaps between images. Only `horiz` takes part in layout; `vert` is for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageMargins {
    pub horiz: f64,
    pub vert: f64,
}

impl Default for ImageMargins {
    fn default() -> Self {
        Self {
            horiz: DEFAULT_MARGIN,
            vert: DEFAULT_MARGIN,
        }
    }
}

/// One configured image. Fields besides `filename` pass through to the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub filename: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageEntry {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryConfig {
    /// Pixel width every row must fill.
    pub width: f64,
    /// Minimum number of images before a row may close.
    pub images_per_row: i64,
    pub image_margins: ImageMargins,
    /// Source images, relative to the context directory.
    pub images_folder: String,
    /// Resized output, relative to the context directory.
    pub thumbs_folder: String,
    /// Images in display order. When absent the images folder is scanned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageEntry>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            images_per_row: DEFAULT_IMAGES_PER_ROW,
            image_margins: ImageMargins::default(),
            images_folder: DEFAULT_IMAGES_FOLDER.to_string(),
            thumbs_folder: DEFAULT_THUMBS_FOLDER.to_string(),
            images: None,
            extra: Map::new(),
        }
    }
}

/// A configuration bound to a context directory, ready for a build.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub layout: LayoutConfig,
    pub images_dir: PathBuf,
    pub thumbs_dir: PathBuf,
    pub images: Option<Vec<ImageEntry>>,
    /// The configuration as given, minus its image list.
    pub settings: GalleryConfig,
}

impl GalleryConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read gallery config: {:?}", path))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("Failed to parse gallery config: {:?}", path))?;
        debug!(?path, "Loaded gallery config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validated layout parameters for this configuration.
    pub fn layout_config(&self) -> LayoutResult<LayoutConfig> {
        // Negative counts map to 0 so they fail the same range check.
        let images_per_row = usize::try_from(self.images_per_row).unwrap_or(0);
        LayoutConfig::new(self.width, images_per_row, self.image_margins.horiz)
    }

    /// Bind the configuration to `context`, the directory its folders are relative to.
    ///
    /// An empty context means the current directory.
    pub fn resolve(&self, context: &Path) -> LayoutResult<ResolvedConfig> {
        let layout = self.layout_config()?;
        let mut settings = self.clone();
        let images = settings.images.take();

        Ok(ResolvedConfig {
            layout,
            images_dir: context.join(&self.images_folder),
            thumbs_dir: context.join(&self.thumbs_folder),
            images,
            settings,
        })
    }
}
