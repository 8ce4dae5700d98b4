//! Raw segmentation mask post-processing
//!
//! Segmentation models emit soft per-pixel probabilities. Before a mask can be
//! edited it is cleaned up with a threshold remap: values below the lower
//! threshold are treated as background noise, values above the upper threshold
//! as solid subject, and everything in between is stretched linearly over the
//! full 0-255 range to keep edges smooth.

use crate::{config::ThresholdConfig, error::Result};
use image::{GrayImage, RgbaImage};

/// Threshold-based cleanup of raw grayscale masks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskPostProcessor {
    thresholds: ThresholdConfig,
    lut: [u8; 256],
}

impl Default for MaskPostProcessor {
    fn default() -> Self {
        Self::from_validated(ThresholdConfig::default())
    }
}

impl MaskPostProcessor {
    /// Create a post-processor for the given thresholds
    ///
    /// # Errors
    /// - `InvalidConfig` when `lower >= upper`
    pub fn new(thresholds: ThresholdConfig) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self::from_validated(thresholds))
    }

    fn from_validated(thresholds: ThresholdConfig) -> Self {
        let mut lut = [0u8; 256];
        for (value, slot) in (0u8..=255).zip(lut.iter_mut()) {
            *slot = remap(value, thresholds.lower, thresholds.upper);
        }
        Self { thresholds, lut }
    }

    /// Thresholds in effect
    #[must_use]
    pub fn thresholds(&self) -> ThresholdConfig {
        self.thresholds
    }

    /// Remap a single raw value
    #[must_use]
    pub fn process_value(&self, value: u8) -> u8 {
        self.lut[usize::from(value)]
    }

    /// Remap every pixel of a raw mask, keeping its dimensions
    #[must_use]
    pub fn process(&self, raw_mask: &GrayImage) -> GrayImage {
        let mut output = raw_mask.clone();
        for pixel in output.pixels_mut() {
            pixel.0[0] = self.process_value(pixel.0[0]);
        }
        output
    }

    /// Remap the alpha channel of an RGBA image into a standalone mask
    #[must_use]
    pub fn process_alpha(&self, image: &RgbaImage) -> GrayImage {
        let (width, height) = image.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            image::Luma([self.process_value(image.get_pixel(x, y).0[3])])
        })
    }
}

/// One-shot remap with explicit thresholds
///
/// # Errors
/// - `InvalidConfig` when `lower >= upper`
pub fn process(raw_mask: &GrayImage, lower: u8, upper: u8) -> Result<GrayImage> {
    let processor = MaskPostProcessor::new(ThresholdConfig { lower, upper })?;
    Ok(processor.process(raw_mask))
}

fn remap(value: u8, lower: u8, upper: u8) -> u8 {
    if value < lower {
        0
    } else if value > upper {
        255
    } else {
        let span = f32::from(upper - lower);
        let scaled = f32::from(value - lower) / span * 255.0;
        scaled.round().clamp(0.0, 255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BgEditError;
    use image::Luma;

    #[test]
    fn test_threshold_boundaries() {
        let processor = MaskPostProcessor::default();
        assert_eq!(processor.process_value(24), 0);
        assert_eq!(processor.process_value(25), 0);
        assert_eq!(processor.process_value(240), 255);
        assert_eq!(processor.process_value(241), 255);
        assert_eq!(processor.process_value(0), 0);
        assert_eq!(processor.process_value(255), 255);
    }

    #[test]
    fn test_linear_remap_midpoint() {
        let processor = MaskPostProcessor::default();
        // (132 - 25) / 215 * 255 = 126.9...
        assert_eq!(processor.process_value(132), 127);
        // (30 - 25) / 215 * 255 = 5.93...
        assert_eq!(processor.process_value(30), 6);
    }

    #[test]
    fn test_remap_is_monotonic() {
        for (lower, upper) in [(25u8, 240u8), (0, 255), (100, 101), (0, 1), (254, 255)] {
            let processor = MaskPostProcessor::new(ThresholdConfig { lower, upper }).unwrap();
            let mut previous = 0u8;
            for value in 0u8..=255 {
                let current = processor.process_value(value);
                assert!(
                    current >= previous,
                    "not monotonic at {} for thresholds {}/{}",
                    value,
                    lower,
                    upper
                );
                previous = current;
            }
        }
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let err = process(&GrayImage::new(1, 1), 240, 25).unwrap_err();
        assert!(matches!(err, BgEditError::InvalidConfig(_)));
        assert!(process(&GrayImage::new(1, 1), 10, 10).is_err());
    }

    #[test]
    fn test_process_keeps_dimensions() {
        let raw = GrayImage::from_fn(5, 3, |x, _| Luma([(x * 60) as u8]));
        let cleaned = process(&raw, 25, 240).unwrap();
        assert_eq!(cleaned.dimensions(), (5, 3));
        assert_eq!(cleaned.get_pixel(0, 0).0[0], 0);
        assert_eq!(cleaned.get_pixel(4, 2).0[0], 255);
    }

    #[test]
    fn test_process_alpha_reads_alpha_channel() {
        let image = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgba([255, 255, 255, 10])
            } else {
                image::Rgba([0, 0, 0, 250])
            }
        });
        let mask = MaskPostProcessor::default().process_alpha(&image);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
        assert_eq!(mask.get_pixel(1, 0).0[0], 255);
    }
}
