//! Capture step: upload, segment, clean up and persist
//!
//! `CaptureProcessor` turns an uploaded image into the two store entries the
//! editor starts from. The segmentation provider and image store are injected
//! so the same pipeline runs against a real model, a precomputed mask or a
//! test double.

use crate::{
    config::{ThresholdConfig, UploadLimits},
    error::{BgEditError, Result},
    postprocess::MaskPostProcessor,
    segmentation::SegmentationProvider,
    services::ImageIOService,
    store::{ImageKey, ImageStore},
};
use image::{imageops, imageops::FilterType, DynamicImage, GrayImage, RgbaImage};
use instant::Instant;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Configuration for the capture step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Thresholds applied to the provider's raw mask
    pub thresholds: ThresholdConfig,
    /// Upload acceptance limits
    pub limits: UploadLimits,
}

/// Timing breakdown for one capture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureTimings {
    /// Upload validation and decoding
    pub decode_ms: u64,

    /// Segmentation provider call
    pub segmentation_ms: u64,

    /// Threshold remap and alpha application
    pub postprocessing_ms: u64,

    /// PNG encoding and store writes
    pub persist_ms: u64,

    /// Total end-to-end time
    pub total_ms: u64,
}

/// Outcome of a capture
#[derive(Debug, Clone)]
pub struct CaptureResult {
    /// Original pixels with alpha replaced by the cleaned mask
    pub processed_image: RgbaImage,

    /// Cleaned mask
    pub mask: GrayImage,

    /// Whether both store entries were written; editing can still continue
    /// in memory when this is `false`
    pub persisted: bool,

    pub timings: CaptureTimings,
}

impl CaptureResult {
    /// Processed image encoded as PNG
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        ImageIOService::encode_png(&self.processed_image)
    }

    /// Fraction of pixels with any foreground coverage
    #[must_use]
    pub fn foreground_ratio(&self) -> f32 {
        let total = self.mask.as_raw().len();
        if total == 0 {
            return 0.0;
        }
        let covered = self.mask.as_raw().iter().filter(|&&value| value > 0).count();
        covered as f32 / total as f32
    }
}

/// Upload-to-store capture pipeline
pub struct CaptureProcessor {
    provider: Arc<dyn SegmentationProvider>,
    store: Arc<dyn ImageStore>,
    config: CaptureConfig,
    post_processor: MaskPostProcessor,
}

impl CaptureProcessor {
    /// Create a processor
    ///
    /// # Errors
    /// - `InvalidConfig` when the thresholds do not validate
    pub fn new(
        provider: Arc<dyn SegmentationProvider>,
        store: Arc<dyn ImageStore>,
        config: CaptureConfig,
    ) -> Result<Self> {
        let post_processor = MaskPostProcessor::new(config.thresholds)?;
        Ok(Self {
            provider,
            store,
            config,
            post_processor,
        })
    }

    #[must_use]
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Run the capture step on an uploaded file
    ///
    /// Storage failures are logged and reported through
    /// [`CaptureResult::persisted`] rather than returned.
    ///
    /// # Errors
    /// - `InputTooLarge` / `UnsupportedFormat` for rejected uploads
    /// - `Decode` when the upload cannot be decoded
    /// - `ModelUnavailable` when segmentation fails
    #[instrument(
        skip(self, upload),
        fields(provider = %self.provider.name(), upload_bytes = upload.len())
    )]
    pub async fn capture(&self, upload: &[u8]) -> Result<CaptureResult> {
        let total_start = Instant::now();
        let mut timings = CaptureTimings::default();

        let decode_start = Instant::now();
        let format = ImageIOService::validate_upload(upload, &self.config.limits)?;
        let image = ImageIOService::decode_bytes(upload)?;
        timings.decode_ms = decode_start.elapsed().as_millis() as u64;
        debug!(
            "Decoded {:?} upload: {}x{}",
            format,
            image.width(),
            image.height()
        );

        let segmentation_start = Instant::now();
        let raw_mask = self.segment(&image).await?;
        timings.segmentation_ms = segmentation_start.elapsed().as_millis() as u64;

        let postprocess_start = Instant::now();
        let mask = self.post_processor.process(&raw_mask);
        let processed_image = Self::apply_mask(&image, &mask)?;
        timings.postprocessing_ms = postprocess_start.elapsed().as_millis() as u64;

        let persist_start = Instant::now();
        let persisted = self.persist(&processed_image, upload).await;
        timings.persist_ms = persist_start.elapsed().as_millis() as u64;
        timings.total_ms = total_start.elapsed().as_millis() as u64;

        info!(
            width = processed_image.width(),
            height = processed_image.height(),
            persisted,
            total_ms = timings.total_ms,
            "Capture complete"
        );

        Ok(CaptureResult {
            processed_image,
            mask,
            persisted,
            timings,
        })
    }

    async fn segment(&self, image: &DynamicImage) -> Result<GrayImage> {
        let raw_mask = self.provider.segment(image).await.map_err(|e| match e {
            BgEditError::ModelUnavailable(_) => e,
            other => BgEditError::model_unavailable(format!(
                "provider '{}' failed: {}",
                self.provider.name(),
                other
            )),
        })?;

        let (width, height) = (image.width(), image.height());
        if raw_mask.dimensions() == (width, height) {
            return Ok(raw_mask);
        }
        if raw_mask.width() == 0 || raw_mask.height() == 0 {
            return Err(BgEditError::model_unavailable(format!(
                "provider '{}' returned an empty mask",
                self.provider.name()
            )));
        }

        warn!(
            mask_width = raw_mask.width(),
            mask_height = raw_mask.height(),
            width,
            height,
            "Segmentation mask size differs from image, resizing"
        );
        Ok(imageops::resize(&raw_mask, width, height, FilterType::Triangle))
    }

    /// Original RGB with alpha replaced by `mask`
    ///
    /// # Errors
    /// - `Processing` when the mask and image sizes differ
    pub fn apply_mask(image: &DynamicImage, mask: &GrayImage) -> Result<RgbaImage> {
        let mut rgba = image.to_rgba8();
        crate::utils::NumericValidator::validate_same_dimensions(
            rgba.dimensions(),
            mask.dimensions(),
            "Mask",
        )?;

        for (pixel, alpha) in rgba.pixels_mut().zip(mask.pixels()) {
            pixel.0[3] = alpha.0[0];
        }
        Ok(rgba)
    }

    async fn persist(&self, processed_image: &RgbaImage, upload: &[u8]) -> bool {
        let processed_png = match ImageIOService::encode_png(processed_image) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode processed image, not persisting");
                return false;
            },
        };

        // Entries from the previous capture must not survive a partial write,
        // or the editor would pair this mask with another upload's pixels.
        for key in ImageKey::ALL {
            if let Err(e) = self.store.remove(key).await {
                warn!(
                    key = %key,
                    store = %self.store.describe(),
                    error = %e,
                    "Failed to clear previous capture, not persisting"
                );
                return false;
            }
        }

        let writes = [
            (ImageKey::ProcessedImage, processed_png),
            (ImageKey::OriginalImage, upload.to_vec()),
        ];
        for (key, bytes) in writes {
            let size = bytes.len();
            if let Err(e) = self.store.put(key, bytes).await {
                warn!(
                    key = %key,
                    size,
                    store = %self.store.describe(),
                    error = %e,
                    "Failed to persist image, editing can continue in memory"
                );
                return false;
            }
        }
        true
    }
}
