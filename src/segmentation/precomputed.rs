//! Provider serving a mask produced ahead of time
//!
//! Lets the editing pipeline run against masks exported by an external
//! segmentation model without linking an inference runtime.

use crate::{
    error::{BgEditError, Result},
    segmentation::SegmentationProvider,
    services::ImageIOService,
};
use async_trait::async_trait;
use image::{DynamicImage, GrayImage};
use std::path::Path;

/// Serves one fixed raw mask for every request
#[derive(Debug, Clone)]
pub struct PrecomputedMaskProvider {
    mask: GrayImage,
    source: String,
}

impl PrecomputedMaskProvider {
    /// Serve an in-memory mask
    #[must_use]
    pub fn new(mask: GrayImage) -> Self {
        Self {
            mask,
            source: "in-memory".to_string(),
        }
    }

    /// Load the mask from an image file
    ///
    /// Color images are converted to luma; an alpha-only PNG works too since
    /// the luma conversion ignores alpha.
    ///
    /// # Errors
    /// - `ModelUnavailable` when the file cannot be read or decoded
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let image = ImageIOService::load_image(path_ref).map_err(|e| {
            BgEditError::model_unavailable(format!(
                "failed to load mask from {}: {}",
                path_ref.display(),
                e
            ))
        })?;

        log::debug!(
            "Loaded precomputed mask {}x{} from {}",
            image.width(),
            image.height(),
            path_ref.display()
        );

        Ok(Self {
            mask: image.to_luma8(),
            source: path_ref.display().to_string(),
        })
    }

    /// Mask served to callers
    #[must_use]
    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }
}

#[async_trait]
impl SegmentationProvider for PrecomputedMaskProvider {
    fn name(&self) -> &str {
        &self.source
    }

    async fn segment(&self, _image: &DynamicImage) -> Result<GrayImage> {
        if self.mask.width() == 0 || self.mask.height() == 0 {
            return Err(BgEditError::model_unavailable(format!(
                "precomputed mask from {} is empty",
                self.source
            )));
        }
        Ok(self.mask.clone())
    }
}
