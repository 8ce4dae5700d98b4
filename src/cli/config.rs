//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{CaptureArgs, EditArgs};
use crate::{
    background::BackgroundSpec,
    config::{EditorConfig, ThresholdConfig, UploadLimits},
    processor::CaptureConfig,
    services::ImageIOService,
    store::FileImageStore,
};
use anyhow::{Context, Result};
use std::path::Path;

/// Convert CLI arguments to library configuration
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the capture configuration
    pub(crate) fn capture_config(args: &CaptureArgs) -> Result<CaptureConfig> {
        let thresholds =
            ThresholdConfig::new(args.lower, args.upper).context("Invalid --lower/--upper")?;
        Ok(CaptureConfig {
            thresholds,
            limits: UploadLimits {
                max_bytes: args.max_upload_bytes,
            },
        })
    }

    /// Build the editor configuration
    pub(crate) fn editor_config(args: &EditArgs) -> Result<EditorConfig> {
        let background = match &args.background {
            Some(value) => Self::parse_background(value)?,
            None => BackgroundSpec::Transparent,
        };

        let config = EditorConfig::builder()
            .brush_radius(args.brush_radius)
            .tool(args.tool.into())
            .history_capacity(args.history_capacity)
            .background(background)
            .build()?;
        Ok(config)
    }

    /// Interpret a `--background` value
    ///
    /// `transparent`, then a `#`-prefixed hex color, then an image path.
    pub(crate) fn parse_background(value: &str) -> Result<BackgroundSpec> {
        if value.eq_ignore_ascii_case("transparent") {
            return Ok(BackgroundSpec::Transparent);
        }
        if value.starts_with('#') {
            return Ok(BackgroundSpec::color(value)?);
        }

        let image = ImageIOService::load_image(value)
            .with_context(|| format!("Background '{}' is not a color or readable image", value))?;
        Ok(BackgroundSpec::image(image.to_rgba8()))
    }

    /// Open the image store at `dir`, or the default location
    pub(crate) fn store(dir: Option<&Path>) -> Result<FileImageStore> {
        match dir {
            Some(dir) => Ok(FileImageStore::new(dir)),
            None => FileImageStore::with_default_dir().context("Failed to locate image store"),
        }
    }
}
