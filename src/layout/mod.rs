//! Justified gallery layout.
//!
//! Pure and synchronous: no I/O, no shared state between calls.

pub mod justified;

pub use justified::{JustifiedLayout, LayoutConfig};

use crate::error::LayoutResult;
use crate::models::{Gallery, ImageDescriptor};

/// Lays out `images` with `config` in one call.
pub fn layout_gallery(images: &[ImageDescriptor], config: LayoutConfig) -> LayoutResult<Gallery> {
    JustifiedLayout::new(config).compute(images)
}
