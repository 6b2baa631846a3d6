use thiserror::Error;

/// Failures raised by the justified layout engine.
///
/// The engine never returns a partial gallery: any of these aborts the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// A layout parameter is out of range.
    #[error("invalid layout config: {0}")]
    InvalidConfig(String),

    /// An image has a non-positive or non-finite intrinsic size.
    #[error("invalid image #{index} ({filename:?}): {width}x{height}")]
    InvalidImage {
        index: usize,
        filename: String,
        width: f64,
        height: f64,
    },

    /// A row reached normalization with no accumulated width.
    #[error("row {row_index} has degenerate accumulated width {width}")]
    DegenerateRow { row_index: usize, width: f64 },
}

pub type LayoutResult<T> = std::result::Result<T, LayoutError>;
