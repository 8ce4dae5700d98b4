//! Segmentation provider abstraction
//!
//! A provider turns a decoded image into a raw foreground-probability mask:
//! one channel, same dimensions as the image, values 0-255. The capture step
//! treats any provider failure as fatal and never substitutes a blank mask.

use crate::error::Result;
use async_trait::async_trait;
use image::{DynamicImage, GrayImage};

pub mod precomputed;

// Test utilities for provider testing
#[cfg(test)]
pub mod test_utils;

pub use self::precomputed::PrecomputedMaskProvider;

/// Source of raw segmentation masks
#[async_trait]
pub trait SegmentationProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Produce a raw mask for `image`
    ///
    /// # Errors
    /// - `ModelUnavailable` when the provider is not loaded or fails
    async fn segment(&self, image: &DynamicImage) -> Result<GrayImage>;
}
