use std::ops::Range;

use tracing::{debug, trace};

use crate::error::{LayoutError, LayoutResult};
use crate::models::{Gallery, ImageDescriptor, PlacedImage, Row};

/// Validated parameters for the justified layout.
///
/// Only constructible through [`LayoutConfig::new`], so a value of this type
/// is always in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    target_width: f64,
    images_per_row: usize,
    horizontal_margin: f64,
}

impl LayoutConfig {
    pub fn new(
        target_width: f64,
        images_per_row: usize,
        horizontal_margin: f64,
    ) -> LayoutResult<Self> {
        if !target_width.is_finite() || target_width <= 0.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "target width must be positive, got {target_width}"
            )));
        }
        if images_per_row < 1 {
            return Err(LayoutError::InvalidConfig(
                "images per row must be at least 1".to_string(),
            ));
        }
        if !horizontal_margin.is_finite() || horizontal_margin < 0.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "horizontal margin must be non-negative, got {horizontal_margin}"
            )));
        }
        Ok(Self {
            target_width,
            images_per_row,
            horizontal_margin,
        })
    }

    /// Total gap width for a row of `count` images.
    fn margins(&self, count: usize) -> f64 {
        count.saturating_sub(1) as f64 * self.horizontal_margin
    }
}

/// Working state for the row currently being filled.
struct RowAccumulator {
    start_index: usize,
    len: usize,
    /// Common reference height: the smallest intrinsic height seen in the row.
    height: f64,
    /// Sum of the row's image widths scaled to `height`.
    width: f64,
}

impl RowAccumulator {
    fn open(start_index: usize, first: &ImageDescriptor) -> Self {
        Self {
            start_index,
            len: 0,
            height: first.height,
            width: 0.0,
        }
    }

    fn push(&mut self, image: &ImageDescriptor) {
        if image.height < self.height {
            // A shorter image lowers the reference height for everything already placed.
            self.width *= image.height / self.height;
            self.height = image.height;
        }
        self.len += 1;
        self.width += image.width * (self.height / image.height);
    }

    fn is_full(&self, config: &LayoutConfig) -> bool {
        self.width + config.margins(self.len) >= config.target_width
            && self.len >= config.images_per_row
    }

    fn range(&self) -> Range<usize> {
        self.start_index..self.start_index + self.len
    }

    fn close(self) -> PendingRow {
        PendingRow {
            range: self.range(),
            height: self.height,
            width: self.width,
        }
    }
}

/// A row after assignment, before normalization.
#[derive(Debug, Clone, PartialEq)]
struct PendingRow {
    range: Range<usize>,
    height: f64,
    width: f64,
}

/// Justified gallery layout.
///
/// Images keep their input order. Each row is scaled so its images, separated
/// by the horizontal margin, fill the target width; render sizes are floored
/// so a row never exceeds it.
#[derive(Debug, Clone)]
pub struct JustifiedLayout {
    config: LayoutConfig,
}

impl JustifiedLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Computes the justified layout for a list of images.
    ///
    /// # Algorithm
    /// 1. Stream images into rows, tracking each row's width at its smallest
    ///    intrinsic height. A row closes once it reaches the target width and
    ///    holds at least `images_per_row` images. A trailing partial row is kept.
    /// 2. Scale every row so its images plus margins fill the target width,
    ///    flooring each render size.
    ///
    /// # Errors
    /// `InvalidImage` for the first image with a non-positive or non-finite
    /// size, or whose size overflows the row's scale computation.
    /// `DegenerateRow` if a row ends up with no accumulated width.
    pub fn compute(&self, images: &[ImageDescriptor]) -> LayoutResult<Gallery> {
        let pending = self.assign_rows(images)?;
        let rows = pending
            .iter()
            .enumerate()
            .map(|(row_index, row)| self.normalize_row(row_index, row, images))
            .collect::<LayoutResult<Vec<_>>>()?;

        debug!(
            images = images.len(),
            rows = rows.len(),
            target_width = self.config.target_width,
            "Computed justified layout"
        );
        Ok(Gallery::new(rows))
    }

    fn validate_image(index: usize, image: &ImageDescriptor) -> LayoutResult<&ImageDescriptor> {
        if image.has_valid_size() {
            Ok(image)
        } else {
            Err(Self::invalid_image(index, image))
        }
    }

    fn invalid_image(index: usize, image: &ImageDescriptor) -> LayoutError {
        LayoutError::InvalidImage {
            index,
            filename: image.filename.clone(),
            width: image.width,
            height: image.height,
        }
    }

    /// Phase 1: greedy single-pass partition into rows.
    fn assign_rows(&self, images: &[ImageDescriptor]) -> LayoutResult<Vec<PendingRow>> {
        let mut rows = Vec::new();
        let mut current: Option<RowAccumulator> = None;

        for (index, image) in images.iter().enumerate() {
            let image = Self::validate_image(index, image)?;
            let acc = current.get_or_insert_with(|| RowAccumulator::open(index, image));
            acc.push(image);
            if !acc.width.is_finite() {
                // Sizes too large to sum; the row scale can no longer be computed.
                return Err(Self::invalid_image(index, image));
            }
            trace!(
                index,
                filename = %image.filename,
                row_height = acc.height,
                row_width = acc.width,
                "Assigned image to row"
            );

            if acc.is_full(&self.config) {
                if let Some(full) = current.take() {
                    rows.push(full.close());
                }
            }
        }

        if let Some(partial) = current {
            rows.push(partial.close());
        }

        Ok(rows)
    }

    /// Phase 2: scale a row so it fills the target width.
    fn normalize_row(
        &self,
        row_index: usize,
        row: &PendingRow,
        images: &[ImageDescriptor],
    ) -> LayoutResult<Row> {
        if !row.width.is_finite() || row.width <= 0.0 || row.range.is_empty() {
            return Err(LayoutError::DegenerateRow {
                row_index,
                width: row.width,
            });
        }

        let count = row.range.len();
        let available_width = self.config.target_width - self.config.margins(count);
        if available_width <= 0.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "margins for row {row_index} ({count} images) leave no room within width {}",
                self.config.target_width
            )));
        }

        let placed = images[row.range.clone()]
            .iter()
            .enumerate()
            .map(|(offset, image)| {
                let mut scale_factor = row.height / image.height;
                scale_factor *= available_width / row.width;
                if !scale_factor.is_finite() {
                    return Err(Self::invalid_image(row.range.start + offset, image));
                }
                Ok(PlacedImage {
                    source: image.clone(),
                    scale_factor,
                    render_width: (image.width * scale_factor).floor() as u32,
                    render_height: (image.height * scale_factor).floor() as u32,
                })
            })
            .collect::<LayoutResult<Vec<_>>>()?;

        debug!(
            row_index,
            images = count,
            row_height = row.height,
            row_width = row.width,
            available_width,
            "Normalized row"
        );
        Ok(Row::new(row_index, row.height, row.width, placed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_image(name: &str, width: u32, height: u32) -> ImageDescriptor {
        ImageDescriptor::from_pixels(name, width, height)
    }

    fn layout(target_width: f64, images_per_row: usize, margin: f64) -> JustifiedLayout {
        JustifiedLayout::new(LayoutConfig::new(target_width, images_per_row, margin).unwrap())
    }

    /// Deterministic mixed-aspect image set (xorshift, no external RNG).
    fn mixed_images(count: usize) -> Vec<ImageDescriptor> {
        let mut state = 0x2545_f491_u64;
        let mut next = |lo: u32, hi: u32| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            lo + (state % (hi - lo) as u64) as u32
        };
        (0..count)
            .map(|i| {
                let w = next(200, 4000);
                let h = next(200, 4000);
                make_image(&format!("{i}.jpg"), w, h)
            })
            .collect()
    }

    #[test]
    fn test_empty_images() {
        let gallery = layout(1200.0, 3, 10.0).compute(&[]).unwrap();
        assert!(gallery.rows.is_empty());
    }

    #[test]
    fn test_identical_squares_fill_one_row() {
        let images: Vec<_> = (0..3).map(|i| make_image(&format!("{i}.jpg"), 100, 100)).collect();
        let gallery = layout(300.0, 1, 0.0).compute(&images).unwrap();

        assert_eq!(gallery.rows.len(), 1);
        for image in &gallery.rows[0].images {
            assert_eq!(image.scale_factor, 1.0);
            assert_eq!((image.render_width, image.render_height), (100, 100));
        }
    }

    #[test]
    fn test_row_height_takes_smallest_image() {
        let images = vec![make_image("wide.jpg", 200, 100), make_image("square.jpg", 100, 100)];
        let gallery = layout(300.0, 2, 0.0).compute(&images).unwrap();

        assert_eq!(gallery.rows.len(), 1);
        let row = &gallery.rows[0];
        assert_eq!(row.height, 100.0);
        assert_eq!(row.width, 300.0);
        let sizes: Vec<_> = row
            .images
            .iter()
            .map(|i| (i.render_width, i.render_height, i.scale_factor))
            .collect();
        assert_eq!(sizes, [(200, 100, 1.0), (100, 100, 1.0)]);
    }

    #[test]
    fn test_trailing_partial_row_is_kept() {
        let images = vec![make_image("a.jpg", 100, 100), make_image("b.jpg", 100, 100)];
        let gallery = layout(300.0, 3, 0.0).compute(&images).unwrap();

        assert_eq!(gallery.rows.len(), 1);
        assert_eq!(gallery.rows[0].len(), 2);
    }

    #[test]
    fn test_zero_height_is_rejected() {
        let images = vec![make_image("a.jpg", 100, 100), make_image("broken.jpg", 100, 0)];
        let err = layout(300.0, 1, 0.0).compute(&images).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::InvalidImage { index: 1, ref filename, .. } if filename == "broken.jpg"
        ));
    }

    #[test]
    fn test_non_finite_size_is_rejected() {
        let images = vec![ImageDescriptor::new("nan.jpg", f64::NAN, 100.0)];
        let err = layout(300.0, 1, 0.0).compute(&images).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidImage { index: 0, .. }));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            LayoutConfig::new(0.0, 1, 0.0),
            Err(LayoutError::InvalidConfig(_))
        ));
        assert!(matches!(
            LayoutConfig::new(-5.0, 1, 0.0),
            Err(LayoutError::InvalidConfig(_))
        ));
        assert!(matches!(
            LayoutConfig::new(f64::INFINITY, 1, 0.0),
            Err(LayoutError::InvalidConfig(_))
        ));
        assert!(matches!(
            LayoutConfig::new(300.0, 0, 0.0),
            Err(LayoutError::InvalidConfig(_))
        ));
        assert!(matches!(
            LayoutConfig::new(300.0, 1, -1.0),
            Err(LayoutError::InvalidConfig(_))
        ));
        assert!(LayoutConfig::new(300.0, 1, 0.0).is_ok());
    }

    #[test]
    fn test_shorter_image_shrinks_accumulated_width() {
        let images = vec![make_image("tall.jpg", 100, 200), make_image("short.jpg", 100, 100)];
        let gallery = layout(1000.0, 1, 0.0).compute(&images).unwrap();

        assert_eq!(gallery.rows.len(), 1);
        let row = &gallery.rows[0];
        assert_eq!(row.height, 100.0);
        assert_eq!(row.width, 150.0);

        let sizes: Vec<_> = row
            .images
            .iter()
            .map(|i| (i.render_width, i.render_height))
            .collect();
        assert_eq!(sizes, [(333, 666), (666, 666)]);
    }

    #[test]
    fn test_images_per_row_forces_overshoot() {
        let images: Vec<_> = (0..4).map(|i| make_image(&format!("{i}.jpg"), 1000, 100)).collect();
        let gallery = layout(100.0, 3, 0.0).compute(&images).unwrap();

        assert_eq!(gallery.rows.len(), 2);
        assert_eq!(gallery.rows[0].len(), 3);
        assert_eq!(gallery.rows[0].width, 3000.0);
        assert!(gallery.rows[0].rendered_width(0.0) <= 100.0);
        assert_eq!(gallery.rows[1].len(), 1);
    }

    #[test]
    fn test_margins_reduce_available_width() {
        let images: Vec<_> = (0..3).map(|i| make_image(&format!("{i}.jpg"), 100, 100)).collect();
        let gallery = layout(310.0, 2, 10.0).compute(&images).unwrap();

        // 200 + 10 < 310 keeps the row open; 300 + 20 closes it.
        assert_eq!(gallery.rows.len(), 1);
        let row = &gallery.rows[0];
        assert_eq!(row.len(), 3);
        assert!(row.images.iter().all(|i| i.render_width == 96));
        assert_eq!(row.rendered_width(10.0), 308.0);
    }

    #[test]
    fn test_margins_wider_than_target_are_rejected() {
        let images: Vec<_> = (0..3).map(|i| make_image(&format!("{i}.jpg"), 10, 10)).collect();
        let err = layout(100.0, 3, 60.0).compute(&images).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidConfig(_)));
    }

    #[test]
    fn test_degenerate_row_fails_fast() {
        let layout = layout(300.0, 1, 0.0);
        let images = vec![make_image("a.jpg", 100, 100)];
        let row = PendingRow {
            range: 0..1,
            height: 100.0,
            width: 0.0,
        };
        let err = layout.normalize_row(4, &row, &images).unwrap_err();
        assert_eq!(
            err,
            LayoutError::DegenerateRow {
                row_index: 4,
                width: 0.0
            }
        );
    }

    #[test]
    fn test_every_image_placed_once_in_order() {
        let images = mixed_images(200);
        let gallery = layout(1200.0, 3, 8.0).compute(&images).unwrap();

        let names: Vec<&str> = gallery.images().map(PlacedImage::filename).collect();
        let expected: Vec<&str> = images.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_rows_fill_width_within_flooring_slack() {
        let margin = 8.0;
        let target = 1200.0;
        let images = mixed_images(200);
        let gallery = layout(target, 3, margin).compute(&images).unwrap();

        for row in &gallery.rows {
            let total = row.rendered_width(margin);
            assert!(total <= target, "row {} overflows: {}", row.row_index, total);
            assert!(
                total > target - row.len() as f64,
                "row {} slack too large: {}",
                row.row_index,
                total
            );
        }
    }

    #[test]
    fn test_minimum_occupancy() {
        let images = mixed_images(100);
        let gallery = layout(900.0, 4, 5.0).compute(&images).unwrap();
        let (last, full) = gallery.rows.split_last().unwrap();
        assert!(full.iter().all(|r| r.len() >= 4));
        assert!(!last.is_empty());
    }

    #[test]
    fn test_row_heights_are_consistent() {
        let images = mixed_images(120);
        let gallery = layout(1600.0, 2, 4.0).compute(&images).unwrap();

        for row in &gallery.rows {
            let heights: Vec<u32> = row.images.iter().map(|i| i.render_height).collect();
            let min = heights.iter().min().unwrap();
            let max = heights.iter().max().unwrap();
            assert!(max - min <= 1, "row {} heights {:?}", row.row_index, heights);
        }
    }

    #[test]
    fn test_layout_is_deterministic() {
        let images = mixed_images(60);
        let layout = layout(1000.0, 3, 6.0);
        assert_eq!(layout.compute(&images).unwrap(), layout.compute(&images).unwrap());
    }

    #[test]
    fn test_extreme_aspect_ratios_floor_to_zero() {
        let images = vec![make_image("wide.jpg", 1000, 1), make_image("tall.jpg", 1, 1000)];
        let gallery = layout(300.0, 2, 0.0).compute(&images).unwrap();

        assert_eq!(gallery.rows.len(), 1);
        let sizes: Vec<_> = gallery.rows[0]
            .images
            .iter()
            .map(|i| (i.render_width, i.render_height))
            .collect();
        // Flooring keeps the row within width even when a side drops to zero.
        assert_eq!(sizes, [(299, 0), (0, 0)]);
    }

    #[test]
    fn test_overflowing_row_width_is_invalid_image() {
        let images = vec![
            ImageDescriptor::new("huge0.jpg", 1e308, 1.0),
            ImageDescriptor::new("huge1.jpg", 1e308, 1.0),
        ];
        let err = layout(300.0, 3, 0.0).compute(&images).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::InvalidImage { index: 1, ref filename, .. } if filename == "huge1.jpg"
        ));
    }

    #[test]
    fn test_vanishing_row_width_is_invalid_image() {
        let images = vec![ImageDescriptor::new("sliver.jpg", 1e-320, 1.0)];
        let err = layout(300.0, 1, 0.0).compute(&images).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidImage { index: 0, .. }));
    }
}
