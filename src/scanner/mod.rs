//! Source image discovery and dimension reads.

pub mod file_scanner;
pub mod metadata;

pub use file_scanner::{FileScanner, ScanConfig};
pub use metadata::MetadataReader;
