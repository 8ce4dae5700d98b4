//! Editable alpha mask layer
//!
//! The mask holds "how much of the original subject survives" at every pixel,
//! independent of the visible pixels. Brush strokes are rasterized as thick
//! lines with round caps and joins and drive every touched pixel fully to the
//! tool's target alpha; there is no anti-aliasing against the prior value.

use crate::{
    config::Tool,
    error::Result,
    types::{HistoryEntry, Stroke, StrokePoint},
    utils::NumericValidator,
};
use image::{GrayImage, Luma};

/// Single-channel alpha grid with stroke editing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskLayer {
    alpha: GrayImage,
}

impl MaskLayer {
    /// Create a fully opaque mask
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            alpha: GrayImage::from_pixel(width, height, Luma([255])),
        }
    }

    /// Create a mask from an existing alpha grid
    #[must_use]
    pub fn from_alpha(alpha: GrayImage) -> Self {
        Self { alpha }
    }

    /// Replace the whole buffer
    ///
    /// # Errors
    /// - `Processing` when the grid size differs from the layer's
    pub fn initialize_from(&mut self, alpha: &GrayImage) -> Result<()> {
        NumericValidator::validate_same_dimensions(self.dimensions(), alpha.dimensions(), "Mask")?;
        self.alpha.clone_from(alpha);
        Ok(())
    }

    /// Mask dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.alpha.dimensions()
    }

    /// Alpha at `(x, y)`, `None` outside the grid
    #[must_use]
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        self.alpha.get_pixel_checked(x, y).map(|p| p.0[0])
    }

    /// Underlying alpha grid
    #[must_use]
    pub fn as_image(&self) -> &GrayImage {
        &self.alpha
    }

    /// Rasterize a complete stroke onto the mask
    pub fn apply_stroke(&mut self, stroke: &Stroke) {
        for (from, to) in stroke.segments() {
            self.apply_segment(from, to, stroke.radius, stroke.tool);
        }
    }

    /// Rasterize one round-capped segment of width `radius`
    ///
    /// A pixel is touched when its center lies within `radius / 2` of the
    /// segment. The pixel under each endpoint is always touched so that thin
    /// brushes still leave a mark. Geometry outside the grid is clipped.
    pub fn apply_segment(&mut self, from: StrokePoint, to: StrokePoint, radius: u32, tool: Tool) {
        if !from.is_finite() || !to.is_finite() {
            return;
        }

        let (width, height) = self.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let target = Luma([tool.target_alpha()]);
        let half_width = radius as f32 / 2.0;
        let half_width_sq = half_width * half_width;

        let min_x = (from.x.min(to.x) - half_width).floor();
        let max_x = (from.x.max(to.x) + half_width).ceil();
        let min_y = (from.y.min(to.y) - half_width).floor();
        let max_y = (from.y.max(to.y) + half_width).ceil();

        if max_x >= 0.0 && max_y >= 0.0 && min_x < width as f32 && min_y < height as f32 {
            let x_start = min_x.max(0.0) as u32;
            let y_start = min_y.max(0.0) as u32;
            let x_end = (max_x as u32).min(width - 1);
            let y_end = (max_y as u32).min(height - 1);

            for y in y_start..=y_end {
                for x in x_start..=x_end {
                    let center = StrokePoint::new(x as f32 + 0.5, y as f32 + 0.5);
                    if distance_sq_to_segment(center, from, to) <= half_width_sq {
                        self.alpha.put_pixel(x, y, target);
                    }
                }
            }
        }

        for point in [from, to] {
            if let Some((x, y)) = self.pixel_under(point) {
                self.alpha.put_pixel(x, y, target);
            }
        }
    }

    /// Copy the full grid into a history entry
    #[must_use]
    pub fn snapshot(&self) -> HistoryEntry {
        HistoryEntry::from_alpha(self.alpha.clone())
    }

    /// Overwrite the grid from a history entry
    ///
    /// # Errors
    /// - `Processing` when the entry was captured from a differently sized mask
    pub fn restore_from(&mut self, entry: &HistoryEntry) -> Result<()> {
        self.initialize_from(entry.as_image())
    }

    fn pixel_under(&self, point: StrokePoint) -> Option<(u32, u32)> {
        let (width, height) = self.dimensions();
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let x = point.x.floor();
        let y = point.y.floor();
        if x < width as f32 && y < height as f32 {
            Some((x as u32, y as u32))
        } else {
            None
        }
    }
}

fn distance_sq_to_segment(p: StrokePoint, a: StrokePoint, b: StrokePoint) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let apx = p.x - a.x;
    let apy = p.y - a.y;
    let length_sq = abx * abx + aby * aby;

    let t = if length_sq > 0.0 {
        ((apx * abx + apy * aby) / length_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let dx = apx - t * abx;
    let dy = apy - t * aby;
    dx * dx + dy * dy
}
