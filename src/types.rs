//! Core value types shared by the editing pipeline

use crate::{config::Tool, error::Result, services::ImageIOService};
use image::{GrayImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A pointer position in image pixel coordinates
///
/// Coordinates are continuous: pixel `(i, j)` covers `[i, i+1) x [j, j+1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
}

impl StrokePoint {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite numbers
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for StrokePoint {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// Pointer samples collected between pointer-down and pointer-up
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Ordered pointer samples, never empty
    pub points: Vec<StrokePoint>,
    /// Brush radius captured when the stroke started
    pub radius: u32,
    /// Operation captured when the stroke started
    pub tool: Tool,
}

impl Stroke {
    /// Start a stroke at `start`
    #[must_use]
    pub fn new(tool: Tool, radius: u32, start: StrokePoint) -> Self {
        Self {
            points: vec![start],
            radius,
            tool,
        }
    }

    /// Build a stroke from a full list of samples
    ///
    /// Returns `None` for an empty sample list.
    #[must_use]
    pub fn from_points(tool: Tool, radius: u32, points: Vec<StrokePoint>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Self {
            points,
            radius,
            tool,
        })
    }

    /// Append a sample
    pub fn push(&mut self, point: StrokePoint) {
        self.points.push(point);
    }

    /// Most recent sample
    #[must_use]
    pub fn last_point(&self) -> Option<StrokePoint> {
        self.points.last().copied()
    }

    /// Segments to rasterize: a zero-length dot at the first sample followed
    /// by one segment per consecutive pair of samples
    pub fn segments(&self) -> impl Iterator<Item = (StrokePoint, StrokePoint)> + '_ {
        let dot = self.points.first().map(|p| (*p, *p));
        dot.into_iter()
            .chain(self.points.windows(2).map(|pair| (pair[0], pair[1])))
    }
}

/// Write-once copy of the mask layer's alpha grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    alpha: GrayImage,
}

impl HistoryEntry {
    pub(crate) fn from_alpha(alpha: GrayImage) -> Self {
        Self { alpha }
    }

    /// The captured alpha grid
    #[must_use]
    pub fn as_image(&self) -> &GrayImage {
        &self.alpha
    }

    /// Grid dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.alpha.dimensions()
    }

    /// Alpha at `(x, y)`, `None` outside the grid
    #[must_use]
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        self.alpha.get_pixel_checked(x, y).map(|p| p.0[0])
    }

    /// Size of the captured grid in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.alpha.as_raw().len()
    }
}

/// Output of one render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeFrame {
    pixels: RgbaImage,
}

impl CompositeFrame {
    pub(crate) fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Rendered straight-alpha RGBA pixels
    #[must_use]
    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Consume the frame, returning its pixels
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Frame dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Pixel at `(x, y)`, `None` outside the frame
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }

    /// Encode the frame as PNG with straight alpha
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        ImageIOService::encode_png(&self.pixels)
    }

    /// Save the frame as PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        ImageIOService::save_png(&self.pixels, path)
    }
}
