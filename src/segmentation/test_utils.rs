//! Mock segmentation providers for testing the capture pipeline
//!
//! Produces deterministic soft masks without a model so capture and
//! post-processing can be tested end to end.

use crate::{
    error::{BgEditError, Result},
    segmentation::SegmentationProvider,
};
use async_trait::async_trait;
use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use std::sync::{Arc, Mutex};

/// Mock provider emitting a soft circular foreground
#[derive(Debug, Clone)]
pub struct MockSegmentationProvider {
    /// Call history for verification in tests
    call_history: Arc<Mutex<Vec<String>>>,
    /// Force the output size instead of matching the input
    output_size: Option<(u32, u32)>,
    /// Whether to simulate a missing model
    should_fail: bool,
}

impl MockSegmentationProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            call_history: Arc::new(Mutex::new(Vec::new())),
            output_size: None,
            should_fail: false,
        }
    }

    /// Create a mock provider that always fails
    #[must_use]
    pub fn new_failing() -> Self {
        let mut provider = Self::new();
        provider.should_fail = true;
        provider
    }

    /// Create a mock provider whose masks have a fixed size
    #[must_use]
    pub fn with_output_size(width: u32, height: u32) -> Self {
        let mut provider = Self::new();
        provider.output_size = Some((width, height));
        provider
    }

    /// Get the call history for verification in tests
    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    fn record_call(&self, entry: String) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(entry);
        }
    }

    /// Circle centered in the grid: 255 at the center falling to 0 at a third
    /// of the shorter side
    #[must_use]
    pub fn circular_mask(width: u32, height: u32) -> GrayImage {
        let center_x = width as f32 / 2.0;
        let center_y = height as f32 / 2.0;
        let radius = (width.min(height) as f32 / 3.0).max(1.0);

        GrayImage::from_fn(width, height, |x, y| {
            let dx = x as f32 + 0.5 - center_x;
            let dy = y as f32 + 0.5 - center_y;
            let distance = (dx * dx + dy * dy).sqrt();
            let value = ((radius - distance) / radius).clamp(0.0, 1.0);
            Luma([(value * 255.0).round() as u8])
        })
    }
}

impl Default for MockSegmentationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SegmentationProvider for MockSegmentationProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn segment(&self, image: &DynamicImage) -> Result<GrayImage> {
        let (width, height) = image.dimensions();
        self.record_call(format!("segment {}x{}", width, height));

        if self.should_fail {
            return Err(BgEditError::model_unavailable("Mock segmentation model not loaded"));
        }

        let (out_width, out_height) = self.output_size.unwrap_or((width, height));
        Ok(Self::circular_mask(out_width, out_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_matches_input_size() {
        let provider = MockSegmentationProvider::new();
        let mask = provider.segment(&DynamicImage::new_rgb8(30, 20)).await.unwrap();

        assert_eq!(mask.dimensions(), (30, 20));
        assert!(mask.get_pixel(15, 10).0[0] > 200);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
        assert_eq!(provider.get_call_history(), vec!["segment 30x20".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let provider = MockSegmentationProvider::new_failing();
        let err = provider.segment(&DynamicImage::new_rgb8(2, 2)).await.unwrap_err();
        assert!(matches!(err, BgEditError::ModelUnavailable(_)));
        assert_eq!(provider.get_call_history().len(), 1);
    }
}
