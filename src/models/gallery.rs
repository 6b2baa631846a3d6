use serde::Serialize;

use super::ImageDescriptor;

/// An image after layout: the input descriptor plus its render size.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedImage {
    #[serde(flatten)]
    pub source: ImageDescriptor,
    pub scale_factor: f64,
    pub render_width: u32,
    pub render_height: u32,
}

impl PlacedImage {
    pub fn filename(&self) -> &str {
        &self.source.filename
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub row_index: usize,
    /// Common reference height the row's images were scaled to during assignment.
    pub height: f64,
    /// Summed width of the row's images at `height`, before normalization.
    pub width: f64,
    pub images: Vec<PlacedImage>,
}

impl Row {
    pub fn new(row_index: usize, height: f64, width: f64, images: Vec<PlacedImage>) -> Self {
        Self {
            row_index,
            height,
            width,
            images,
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Rendered width of the row including the gaps between images.
    pub fn rendered_width(&self, horizontal_margin: f64) -> f64 {
        let images: u64 = self.images.iter().map(|i| i.render_width as u64).sum();
        images as f64 + self.images.len().saturating_sub(1) as f64 * horizontal_margin
    }
}

/// The laid-out gallery: rows in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Gallery {
    pub rows: Vec<Row>,
}

impl Gallery {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn image_count(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }

    /// Iterates every placed image in input order.
    pub fn images(&self) -> impl Iterator<Item = &PlacedImage> {
        self.rows.iter().flat_map(|r| r.images.iter())
    }
}
