//! Image discovery and dimension gathering.
//!
//! This module provides the `FileScanner` struct which handles:
//! - Listing image files in the images folder using walkdir
//! - Image detection by file extension
//! - Concurrent dimension reads on the blocking pool, returned in input order

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::task;
use tracing::{debug, info, trace};
use walkdir::WalkDir;

use crate::models::{is_image_path, ImageDescriptor};
use crate::scanner::metadata::MetadataReader;

/// Configuration for the file scanner.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum directory depth (1 = only the folder itself, 0 = unlimited).
    pub max_depth: usize,
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 1,
            follow_symlinks: false,
        }
    }
}

/// Finds images and reads their dimensions.
pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    /// Creates a new file scanner with default configuration.
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    /// Creates a new file scanner with custom configuration.
    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Lists image files under `dir` in file-name order, each directory
    /// listed where it sorts among its siblings.
    ///
    /// Returned names are relative to `dir` so they can be joined onto both
    /// the images folder and the thumbs folder.
    pub fn discover(&self, dir: &Path) -> Result<Vec<String>> {
        let mut walker = WalkDir::new(dir)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if self.config.max_depth > 0 {
            walker = walker.max_depth(self.config.max_depth);
        }

        let mut found = Vec::new();
        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to scan {:?}", dir))?;
            if entry.file_type().is_dir() || !is_image_path(entry.path()) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(dir)
                .with_context(|| format!("{:?} escaped scan root {:?}", entry.path(), dir))?;
            trace!(path = ?relative, "Discovered image");
            found.push(relative.to_path_buf());
        }

        info!("Discovered {} images in {:?}", found.len(), dir);
        Ok(found
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect())
    }

    /// Reads dimensions for every filename concurrently.
    ///
    /// Results are in the order of `filenames`. All reads are awaited; the
    /// first failure in input order is returned.
    pub async fn gather(dir: &Path, filenames: &[String]) -> Result<Vec<ImageDescriptor>> {
        let handles: Vec<_> = filenames
            .iter()
            .map(|filename| {
                let dir: PathBuf = dir.to_path_buf();
                let filename = filename.clone();
                task::spawn_blocking(move || MetadataReader::describe(&dir, &filename))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.context("Metadata task panicked")?);
        }

        let descriptors = results.into_iter().collect::<Result<Vec<_>>>()?;
        debug!(count = descriptors.len(), "Gathered image dimensions");
        Ok(descriptors)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn create_test_image(path: &Path, width: u32, height: u32) {
        RgbImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn test_scan_config_default() {
        let config = ScanConfig::default();
        assert_eq!(config.max_depth, 1);
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = tempdir().unwrap();
        let found = FileScanner::new().discover(dir.path()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_discover_sorted_images_only() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("b.png"), 2, 2);
        create_test_image(&dir.path().join("a.png"), 2, 2);
        File::create(dir.path().join("notes.txt")).unwrap();

        let found = FileScanner::new().discover(dir.path()).unwrap();
        assert_eq!(found, ["a.png", "b.png"]);
    }

    #[test]
    fn test_discover_depth() {
        let dir = tempdir().unwrap();
        let subdir = dir.path().join("sub");
        fs::create_dir(&subdir).unwrap();
        create_test_image(&dir.path().join("root.png"), 2, 2);
        create_test_image(&subdir.join("nested.png"), 2, 2);

        let found = FileScanner::new().discover(dir.path()).unwrap();
        assert_eq!(found, ["root.png"]);

        let scanner = FileScanner::with_config(ScanConfig {
            max_depth: 0,
            ..Default::default()
        });
        let found = scanner.discover(dir.path()).unwrap();
        assert_eq!(found, ["root.png", "sub/nested.png"]);
    }

    #[test]
    fn test_discover_missing_dir_fails() {
        let dir = tempdir().unwrap();
        assert!(FileScanner::new().discover(&dir.path().join("absent")).is_err());
    }

    #[tokio::test]
    async fn test_gather_keeps_input_order() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("wide.png"), 40, 10);
        create_test_image(&dir.path().join("tall.png"), 10, 40);
        create_test_image(&dir.path().join("square.png"), 20, 20);

        let names = vec![
            "tall.png".to_string(),
            "square.png".to_string(),
            "wide.png".to_string(),
        ];
        let images = FileScanner::gather(dir.path(), &names).await.unwrap();
        let sizes: Vec<_> = images
            .iter()
            .map(|i| (i.filename.as_str(), i.width, i.height))
            .collect();
        assert_eq!(
            sizes,
            [
                ("tall.png", 10.0, 40.0),
                ("square.png", 20.0, 20.0),
                ("wide.png", 40.0, 10.0)
            ]
        );
    }

    #[tokio::test]
    async fn test_gather_fails_on_missing_image() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("ok.png"), 4, 4);

        let names = vec!["ok.png".to_string(), "missing.png".to_string()];
        let err = FileScanner::gather(dir.path(), &names).await.unwrap_err();
        assert!(format!("{err:#}").contains("missing.png"));
    }
}
