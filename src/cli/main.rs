//! Mask Editing CLI Tool
//!
//! Two steps sharing a directory-backed image store:
//! `capture` segments an upload and persists it, `edit` loads it back,
//! replays an edit script and exports the composite.

use super::config::CliConfigBuilder;
use crate::{
    config::{
        Tool, DEFAULT_BRUSH_RADIUS, DEFAULT_HISTORY_CAPACITY, DEFAULT_LOWER_THRESHOLD,
        DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_UPPER_THRESHOLD,
    },
    processor::CaptureProcessor,
    script::EditScript,
    segmentation::PrecomputedMaskProvider,
    services::ImageIOService,
    session::EditSession,
    store::ImageStore,
    tracing_config::{init_cli_tracing, spans},
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info, warn, Instrument};

/// Background removal mask editing tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "imgly-bgedit")]
pub struct Cli {
    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Segment an image and store it for editing
    Capture(CaptureArgs),
    /// Edit the stored image and export the result
    Edit(EditArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// Image to cut out
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Raw grayscale segmentation mask for INPUT
    #[arg(long, value_name = "RAW_MASK")]
    pub mask: PathBuf,

    /// Image store directory [default: user cache directory]
    #[arg(long, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Raw mask values below this become transparent
    #[arg(long, default_value_t = DEFAULT_LOWER_THRESHOLD)]
    pub lower: u8,

    /// Raw mask values above this become opaque
    #[arg(long, default_value_t = DEFAULT_UPPER_THRESHOLD)]
    pub upper: u8,

    /// Largest accepted upload in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Also write the processed image here
    #[arg(long, value_name = "OUT.png")]
    pub preview: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Image store directory [default: user cache directory]
    #[arg(long, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// JSON edit script to replay
    #[arg(long, value_name = "FILE.json")]
    pub script: Option<PathBuf>,

    /// Background: "transparent", a hex color such as "#00ff00", or an image path
    #[arg(long, value_name = "BACKGROUND")]
    pub background: Option<String>,

    /// Brush radius in pixels (1-100)
    #[arg(long, default_value_t = DEFAULT_BRUSH_RADIUS)]
    pub brush_radius: u32,

    /// Initial brush tool
    #[arg(long, value_enum, default_value_t = CliTool::Erase)]
    pub tool: CliTool,

    /// Number of undo snapshots to keep
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: usize,

    /// Output PNG [default: edited-image-<timestamp>.png]
    #[arg(short, long, value_name = "OUT.png")]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliTool {
    Erase,
    Restore,
}

impl From<CliTool> for Tool {
    fn from(tool: CliTool) -> Self {
        match tool {
            CliTool::Erase => Self::Erase,
            CliTool::Restore => Self::Restore,
        }
    }
}

/// Entry point for the CLI binary
pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_cli_tracing(cli.verbose).context("Failed to initialize tracing")?;

    match cli.command {
        Command::Capture(args) => {
            let span = spans::capture(&args.input, &args.mask);
            run_capture(&args).instrument(span).await
        },
        Command::Edit(args) => {
            let span = spans::edit(args.store_dir.as_deref(), args.script.as_deref());
            run_edit(&args).instrument(span).await
        },
    }
}

async fn run_capture(args: &CaptureArgs) -> Result<()> {
    let config = CliConfigBuilder::capture_config(args).context("Invalid capture options")?;
    let store = CliConfigBuilder::store(args.store_dir.as_deref())?;
    let provider = PrecomputedMaskProvider::from_file(&args.mask)
        .with_context(|| format!("Failed to load mask {}", args.mask.display()))?;

    let upload = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let store_description = store.describe();
    let processor = CaptureProcessor::new(Arc::new(provider), Arc::new(store), config)?;
    let result = processor
        .capture(&upload)
        .await
        .with_context(|| format!("Failed to capture {}", args.input.display()))?;

    if let Some(preview) = &args.preview {
        ImageIOService::save_png(&result.processed_image, preview)
            .with_context(|| format!("Failed to write preview {}", preview.display()))?;
        debug!(path = %preview.display(), "Wrote preview");
    }

    let (width, height) = result.processed_image.dimensions();
    if result.persisted {
        info!(store = %store_description, "Stored processed and original images");
        println!(
            "Captured {}x{} image ({:.1}% foreground) into {}",
            width,
            height,
            result.foreground_ratio() * 100.0,
            store_description
        );
    } else {
        warn!("Image store rejected the capture; the edit step will not find it");
        println!(
            "Captured {}x{} image but could not store it in {}",
            width, height, store_description
        );
    }
    Ok(())
}

async fn run_edit(args: &EditArgs) -> Result<()> {
    let store = CliConfigBuilder::store(args.store_dir.as_deref())?;

    let config = CliConfigBuilder::editor_config(args).context("Invalid edit options")?;
    let mut session = EditSession::load(&store, config)
        .await
        .context("Failed to start editing session")?;

    if let Some(script_path) = &args.script {
        let script = EditScript::from_file(script_path)
            .with_context(|| format!("Failed to read script {}", script_path.display()))?;
        let summary = script
            .replay(&mut session)
            .with_context(|| format!("Failed to replay {}", script_path.display()))?;
        info!(
            applied = summary.applied,
            history_len = summary.history_len,
            "Replayed edit script"
        );
    }

    if session.on_pointer_up() {
        debug!("Committed stroke left open by the script");
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(ImageIOService::export_file_name()));
    let png = session.export_png().context("Failed to encode PNG")?;
    tokio::fs::write(&output, &png)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Exported {} ({} bytes)", output.display(), png.len());
    Ok(())
}
