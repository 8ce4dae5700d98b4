//! Error types for mask editing operations

use thiserror::Error;

/// Result type alias for mask editing operations
pub type Result<T> = std::result::Result<T, BgEditError>;

/// Error types for capture, editing and export operations
#[derive(Error, Debug)]
pub enum BgEditError {
    /// No processed image in the image store; the session cannot start
    #[error("No image to edit: {0}")]
    MissingInput(String),

    /// Segmentation provider failed or is not loaded
    #[error("Segmentation model unavailable: {0}")]
    ModelUnavailable(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An uploaded or stored image could not be decoded
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Upload is not an image the decoder recognizes
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Upload exceeds the configured size limit
    #[error("Input too large: {size} bytes (limit: {limit} bytes)")]
    InputTooLarge { size: usize, limit: usize },

    /// Writing to the image store failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Editing was attempted before a session was initialized
    #[error("Editor not initialized: {0}")]
    NotInitialized(String),

    /// Command rejected because a stroke is still in progress
    #[error("Stroke in progress: {0}")]
    StrokeInProgress(String),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Pixel processing errors (dimension mismatches and the like)
    #[error("Processing error: {0}")]
    Processing(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BgEditError {
    /// Create a new missing input error
    pub fn missing_input<S: Into<String>>(msg: S) -> Self {
        Self::MissingInput(msg.into())
    }

    /// Create a new model unavailable error
    pub fn model_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S) -> Self {
        Self::UnsupportedFormat(format.into())
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new not-initialized error
    pub fn not_initialized<S: Into<String>>(msg: S) -> Self {
        Self::NotInitialized(msg.into())
    }

    /// Create a new stroke-in-progress error
    pub fn stroke_in_progress<S: Into<String>>(msg: S) -> Self {
        Self::StrokeInProgress(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create storage error with key context
    pub fn storage_write_error(key: &str, details: &str) -> Self {
        Self::Storage(format!("Failed to write '{}': {}", key, details))
    }

    /// Whether the error leaves an already-running session usable
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_) | Self::Storage(_) | Self::StrokeInProgress(_)
        )
    }
}
