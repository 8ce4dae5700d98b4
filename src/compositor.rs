//! Deterministic compositing of original pixels, mask and background
//!
//! Every render starts from scratch: paint the background, intersect the
//! original image's alpha with the mask, then draw the subject over the
//! background with straight-alpha "over" compositing. All blending is done in
//! integer arithmetic so repeated renders are bit-identical.

use crate::{
    background::BackgroundSpec,
    error::Result,
    mask::MaskLayer,
    types::CompositeFrame,
    utils::NumericValidator,
};
use image::{imageops, imageops::FilterType, Rgba, RgbaImage};
use instant::Instant;
use tracing::{debug, warn};

/// Stateless renderer for editing frames
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositePipeline;

impl CompositePipeline {
    /// Render one frame
    ///
    /// # Errors
    /// - `Processing` when the mask and image sizes differ
    pub fn render(
        image: &RgbaImage,
        mask: &MaskLayer,
        background: &BackgroundSpec,
    ) -> Result<CompositeFrame> {
        NumericValidator::validate_same_dimensions(image.dimensions(), mask.dimensions(), "Mask")?;

        let render_start = Instant::now();
        let (width, height) = image.dimensions();
        let mut frame = Self::paint_background(width, height, background);

        let alpha = mask.as_image();
        for ((dst, src), m) in frame
            .pixels_mut()
            .zip(image.pixels())
            .zip(alpha.pixels())
        {
            let subject_alpha = mul_div_255(u32::from(src.0[3]), u32::from(m.0[0]));
            *dst = over(*src, subject_alpha, *dst);
        }

        debug!(
            width,
            height,
            background = background.kind(),
            elapsed_us = render_start.elapsed().as_micros() as u64,
            "Rendered composite frame"
        );

        Ok(CompositeFrame::new(frame))
    }

    /// Background layer sized to exactly fill a `width` x `height` frame
    #[must_use]
    pub fn paint_background(width: u32, height: u32, background: &BackgroundSpec) -> RgbaImage {
        match background {
            BackgroundSpec::Transparent => RgbaImage::new(width, height),
            BackgroundSpec::Color(color) => RgbaImage::from_pixel(width, height, color.rgba()),
            BackgroundSpec::Image(source) => Self::cover_fit(source, width, height),
        }
    }

    /// Scale `source` uniformly to cover the frame, center it and crop the overflow
    #[must_use]
    pub fn cover_fit(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
        let (source_width, source_height) = source.dimensions();
        if source_width == 0 || source_height == 0 {
            warn!("Background image has no pixels, using a transparent background");
            return RgbaImage::new(width, height);
        }
        if width == 0 || height == 0 {
            return RgbaImage::new(width, height);
        }

        let ratio = (f64::from(width) / f64::from(source_width))
            .max(f64::from(height) / f64::from(source_height));
        let scaled_width = ((f64::from(source_width) * ratio).round() as u32).max(width);
        let scaled_height = ((f64::from(source_height) * ratio).round() as u32).max(height);

        let scaled = if (scaled_width, scaled_height) == (source_width, source_height) {
            source.clone()
        } else {
            imageops::resize(source, scaled_width, scaled_height, FilterType::Triangle)
        };

        let offset_x = (scaled_width - width) / 2;
        let offset_y = (scaled_height - height) / 2;
        imageops::crop_imm(&scaled, offset_x, offset_y, width, height).to_image()
    }
}

/// `a * b / 255`, rounded
fn mul_div_255(a: u32, b: u32) -> u32 {
    (a * b + 127) / 255
}

/// Straight-alpha source-over with the subject's effective alpha
fn over(src: Rgba<u8>, src_alpha: u32, dst: Rgba<u8>) -> Rgba<u8> {
    let dst_alpha = u32::from(dst.0[3]);
    let dst_weight = dst_alpha * (255 - src_alpha);
    // Both weights are scaled by 255.
    let src_weight = src_alpha * 255;
    let total = src_weight + dst_weight;

    if total == 0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let value = (u32::from(s) * src_weight + u32::from(d) * dst_weight + total / 2) / total;
        value.min(255) as u8
    };

    Rgba([
        blend(src.0[0], dst.0[0]),
        blend(src.0[1], dst.0[1]),
        blend(src.0[2], dst.0[2]),
        ((total + 127) / 255).min(255) as u8,
    ])
}
