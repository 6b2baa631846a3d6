//! Thumbnail pipeline for the gallery builder.
//!
//! This module provides:
//! - `ThumbnailGenerator` - Resizes a source image to an exact size
//! - `ThumbnailQueue` - Worker pool that runs resize jobs in parallel

pub mod generator;
pub mod queue;

pub use generator::ThumbnailGenerator;
pub use queue::{default_workers, ResizeOutcome, ResizeRequest, ThumbnailQueue};
