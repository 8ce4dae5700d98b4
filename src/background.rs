//! Backgrounds the compositor can paint behind the subject

use crate::error::{BgEditError, Result};
use image::{Rgba, RgbaImage};

/// A solid color parsed from a CSS-style hex string
///
/// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa` (the leading `#` is optional).
/// The original string is kept for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexColor {
    source: String,
    rgba: Rgba<u8>,
}

impl HexColor {
    /// Parse a hex color string
    ///
    /// # Errors
    /// - `InvalidConfig` for anything that is not a 3, 6 or 8 digit hex color
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid_color(value));
        }

        let channel = |range: std::ops::Range<usize>| -> Result<u8> {
            let slice = digits.get(range).ok_or_else(|| invalid_color(value))?;
            u8::from_str_radix(slice, 16).map_err(|_| invalid_color(value))
        };

        let rgba = match digits.len() {
            3 => {
                let short = |i: usize| -> Result<u8> { Ok(channel(i..i + 1)? * 17) };
                Rgba([short(0)?, short(1)?, short(2)?, 255])
            },
            6 => Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255]),
            8 => Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, channel(6..8)?]),
            _ => return Err(invalid_color(value)),
        };

        Ok(Self {
            source: trimmed.to_string(),
            rgba,
        })
    }

    /// Build a color from channel values
    #[must_use]
    pub fn from_rgba(rgba: Rgba<u8>) -> Self {
        let [r, g, b, a] = rgba.0;
        let source = if a == 255 {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        };
        Self { source, rgba }
    }

    /// The color as it was written
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parsed channel values
    #[must_use]
    pub fn rgba(&self) -> Rgba<u8> {
        self.rgba
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for HexColor {
    type Err = BgEditError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn invalid_color(value: &str) -> BgEditError {
    BgEditError::invalid_config(format!(
        "Invalid background color '{}', expected #rgb, #rrggbb or #rrggbbaa",
        value
    ))
}

/// What the subject is composed over
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackgroundSpec {
    /// Frame starts fully transparent
    #[default]
    Transparent,
    /// Flat fill
    Color(HexColor),
    /// Cover-fit, centered background image
    Image(RgbaImage),
}

impl BackgroundSpec {
    /// Solid color background from a hex string
    ///
    /// # Errors
    /// - `InvalidConfig` when the color cannot be parsed
    pub fn color(hex: &str) -> Result<Self> {
        Ok(Self::Color(HexColor::parse(hex)?))
    }

    /// Image background
    #[must_use]
    pub fn image(image: RgbaImage) -> Self {
        Self::Image(image)
    }

    /// Short description for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transparent => "transparent",
            Self::Color(_) => "color",
            Self::Image(_) => "image",
        }
    }
}
