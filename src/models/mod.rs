pub mod gallery;
pub mod image_item;

pub use gallery::*;
pub use image_item::*;
