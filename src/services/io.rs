//! Image I/O operations service
//!
//! Keeps decoding, encoding and file access out of the editing logic so the
//! session and compositor only ever see decoded pixel buffers.

use crate::{
    config::UploadLimits,
    error::{BgEditError, Result},
};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::{io::Cursor, path::Path};

/// Service for handling image input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Check an upload before decoding it
    ///
    /// The format is sniffed from the content, never from a file name.
    ///
    /// # Returns
    /// * `Ok(ImageFormat)` - Detected container format
    ///
    /// # Errors
    /// - `InputTooLarge` when the upload exceeds `limits.max_bytes`
    /// - `UnsupportedFormat` when the bytes are not a recognized image
    pub fn validate_upload(bytes: &[u8], limits: &UploadLimits) -> Result<ImageFormat> {
        if bytes.len() > limits.max_bytes {
            return Err(BgEditError::InputTooLarge {
                size: bytes.len(),
                limit: limits.max_bytes,
            });
        }

        image::guess_format(bytes).map_err(|e| {
            log::debug!("Format detection failed for {} byte upload: {}", bytes.len(), e);
            BgEditError::unsupported_format(format!(
                "upload of {} bytes is not a recognized image",
                bytes.len()
            ))
        })
    }

    /// Decode an image from bytes
    ///
    /// # Errors
    /// - `Decode` when the bytes cannot be decoded
    ///
    /// # Examples
    /// ```rust,no_run
    /// use imgly_bgedit::services::ImageIOService;
    ///
    /// let data = std::fs::read("input.png")?;
    /// let image = ImageIOService::decode_bytes(&data)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| {
            log::debug!("Failed to decode {} byte image: {}", bytes.len(), e);
            BgEditError::decode(e.to_string())
        })
    }

    /// Load an image from a file path
    ///
    /// Tries extension-based detection first and falls back to sniffing the
    /// content, so mislabeled files still load.
    ///
    /// # Errors
    /// - `Io` when the file cannot be read
    /// - `Decode` when neither detection method can decode it
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(open_err) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    open_err
                );

                let data = std::fs::read(path_ref)?;
                image::load_from_memory(&data).map_err(|content_err| {
                    BgEditError::decode(format!(
                        "{}: {} ({} bytes)",
                        path_ref.display(),
                        content_err,
                        data.len()
                    ))
                })
            },
        }
    }

    /// Encode RGBA pixels as a PNG with straight alpha
    ///
    /// # Errors
    /// - `Image` when the encoder fails
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
        Ok(buffer)
    }

    /// Save RGBA pixels as a PNG file, creating parent directories
    ///
    /// # Errors
    /// - `Io` when the directory cannot be created
    /// - `Image` when encoding or writing fails
    pub fn save_png<P: AsRef<Path>>(image: &RgbaImage, path: P) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        image.save_with_format(path_ref, ImageFormat::Png)?;
        log::debug!("Saved {}x{} PNG to {}", image.width(), image.height(), path_ref.display());
        Ok(())
    }

    /// Download name for an exported frame: `edited-image-<unix millis>.png`
    #[must_use]
    pub fn export_file_name() -> String {
        format!("edited-image-{}.png", chrono::Utc::now().timestamp_millis())
    }
}
