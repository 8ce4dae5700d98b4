//! Configuration types for capture and mask editing

use crate::{
    background::BackgroundSpec,
    error::{BgEditError, Result},
    utils::NumericValidator,
};
use serde::{Deserialize, Serialize};

/// Smallest brush radius accepted by the editor
pub const MIN_BRUSH_RADIUS: u32 = 1;
/// Largest brush radius accepted by the editor
pub const MAX_BRUSH_RADIUS: u32 = 100;
/// Brush radius used when none is configured
pub const DEFAULT_BRUSH_RADIUS: u32 = 20;
/// Number of mask snapshots retained for undo/redo
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;
/// Raw mask values below this become fully transparent
pub const DEFAULT_LOWER_THRESHOLD: u8 = 25;
/// Raw mask values above this become fully opaque
pub const DEFAULT_UPPER_THRESHOLD: u8 = 240;
/// Largest upload accepted by the capture step (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Brush operation applied to the mask layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Punch a transparent hole (alpha 0)
    #[default]
    Erase,
    /// Fully reveal the original pixel (alpha 255)
    Restore,
}

impl Tool {
    /// Alpha value every touched pixel is driven to
    #[must_use]
    pub fn target_alpha(self) -> u8 {
        match self {
            Self::Erase => 0,
            Self::Restore => 255,
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Erase => write!(f, "erase"),
            Self::Restore => write!(f, "restore"),
        }
    }
}

impl std::str::FromStr for Tool {
    type Err = BgEditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "erase" => Ok(Self::Erase),
            "restore" => Ok(Self::Restore),
            other => Err(BgEditError::invalid_config(format!(
                "Unknown tool '{}', expected 'erase' or 'restore'",
                other
            ))),
        }
    }
}

/// Threshold pair used to clean up raw segmentation masks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Values strictly below this map to 0
    pub lower: u8,
    /// Values strictly above this map to 255
    pub upper: u8,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            lower: DEFAULT_LOWER_THRESHOLD,
            upper: DEFAULT_UPPER_THRESHOLD,
        }
    }
}

impl ThresholdConfig {
    /// Create a validated threshold pair
    ///
    /// # Errors
    /// - `lower` is not strictly below `upper`
    pub fn new(lower: u8, upper: u8) -> Result<Self> {
        let thresholds = Self { lower, upper };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Ensure `lower < upper`
    ///
    /// # Errors
    /// - `lower` is not strictly below `upper`
    pub fn validate(&self) -> Result<()> {
        if self.lower >= self.upper {
            return Err(BgEditError::invalid_config(format!(
                "Lower threshold ({}) must be below upper threshold ({})",
                self.lower, self.upper
            )));
        }
        Ok(())
    }
}

/// Limits applied to uploads in the capture step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLimits {
    /// Maximum accepted upload size in bytes
    pub max_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Configuration for an editing session
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Brush radius in pixels (1-100)
    pub brush_radius: u32,

    /// Active brush tool
    pub tool: Tool,

    /// Background the subject is composed over
    pub background: BackgroundSpec,

    /// Number of full-resolution mask snapshots kept for undo/redo
    pub history_capacity: usize,

    /// Thresholds applied to the stored alpha when the mask is initialized
    pub thresholds: ThresholdConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            brush_radius: DEFAULT_BRUSH_RADIUS,
            tool: Tool::default(),
            background: BackgroundSpec::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Create a new configuration builder for fluent API construction
    ///
    /// # Examples
    ///
    /// ```rust
    /// use imgly_bgedit::{EditorConfig, Tool};
    ///
    /// let config = EditorConfig::builder()
    ///     .brush_radius(8)
    ///     .tool(Tool::Restore)
    ///     .history_capacity(10)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.brush_radius, 8);
    /// ```
    #[must_use]
    pub fn builder() -> EditorConfigBuilder {
        EditorConfigBuilder::default()
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Brush radius outside 1-100
    /// - History capacity of zero
    /// - Lower threshold not below upper threshold
    pub fn validate(&self) -> Result<()> {
        validate_brush_radius(self.brush_radius)?;
        validate_history_capacity(self.history_capacity)?;
        self.thresholds.validate()
    }
}

/// Check a brush radius against the accepted range
///
/// # Errors
/// - Radius outside `MIN_BRUSH_RADIUS..=MAX_BRUSH_RADIUS`
pub fn validate_brush_radius(radius: u32) -> Result<u32> {
    NumericValidator::validate_range(radius, MIN_BRUSH_RADIUS, MAX_BRUSH_RADIUS, "brush radius")
}

/// Check a history capacity
///
/// # Errors
/// - Capacity of zero
pub fn validate_history_capacity(capacity: usize) -> Result<usize> {
    NumericValidator::validate_positive(capacity, "History capacity")
}

/// Builder for `EditorConfig`
#[derive(Debug, Default)]
pub struct EditorConfigBuilder {
    config: EditorConfig,
}

impl EditorConfigBuilder {
    /// Set brush radius
    #[must_use]
    pub fn brush_radius(mut self, radius: u32) -> Self {
        self.config.brush_radius = radius;
        self
    }

    /// Set brush tool
    #[must_use]
    pub fn tool(mut self, tool: Tool) -> Self {
        self.config.tool = tool;
        self
    }

    /// Set background
    #[must_use]
    pub fn background(mut self, background: BackgroundSpec) -> Self {
        self.config.background = background;
        self
    }

    /// Set history capacity
    #[must_use]
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    /// Set mask thresholds
    #[must_use]
    pub fn thresholds(mut self, lower: u8, upper: u8) -> Self {
        self.config.thresholds = ThresholdConfig { lower, upper };
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// - Any value rejected by [`EditorConfig::validate`]
    pub fn build(self) -> Result<EditorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
