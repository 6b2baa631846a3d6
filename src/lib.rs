//! Justified photo gallery builder.
//!
//! Images are packed into rows that exactly fill a target width, each row
//! scaled to a common height, and resized copies are written at the computed
//! sizes.
//!
//! - [`layout`]: the pure layout engine
//! - [`config`]: JSON gallery configuration with defaults
//! - [`scanner`]: image discovery and dimension reads
//! - [`thumbnails`]: resize jobs on a worker pool
//! - [`pipeline`]: the end-to-end build producing a manifest

pub mod config;
pub mod error;
pub mod layout;
pub mod models;
pub mod pipeline;
pub mod scanner;
pub mod thumbnails;

pub use config::GalleryConfig;
pub use error::{LayoutError, LayoutResult};
pub use layout::{layout_gallery, JustifiedLayout, LayoutConfig};
pub use models::{Gallery, ImageDescriptor, PlacedImage, Row};
pub use pipeline::{build_gallery, BuildOptions, GalleryBuild, GalleryManifest};
