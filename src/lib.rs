#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # IMG.LY Background Edit Library
//!
//! Interactive refinement of background-removal results. A segmentation
//! provider produces a soft foreground mask; this crate cleans it up, lets a
//! user erase or restore parts of it with a brush, keeps a bounded undo/redo
//! history and composes the cut-out subject over a transparent, solid color
//! or image background.
//!
//! ## Features
//!
//! - **Mask Cleanup**: Threshold remap of raw segmentation masks (25/240 by default)
//! - **Brush Editing**: Round-capped erase/restore strokes with no gaps on fast moves
//! - **Undo/Redo**: Linear history of full mask snapshots with a fixed capacity
//! - **Compositing**: Deterministic straight-alpha rendering over any background
//! - **Capture Step**: Upload validation, segmentation and persistence in one call
//! - **Image Stores**: In-memory and directory-backed storage between steps
//! - **Edit Scripts**: JSON command lists replayed against a session
//! - **CLI Integration**: Optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgly_bgedit::{
//!     CaptureConfig, CaptureProcessor, EditSession, EditorConfig, MemoryImageStore,
//!     PrecomputedMaskProvider, StrokePoint, Tool,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = Arc::new(MemoryImageStore::new());
//! let provider = Arc::new(PrecomputedMaskProvider::from_file("mask.png")?);
//! let capture = CaptureProcessor::new(provider, store.clone(), CaptureConfig::default())?;
//! capture.capture(&std::fs::read("photo.jpg")?).await?;
//!
//! let config = EditorConfig::builder().brush_radius(12).build()?;
//! let mut session = EditSession::load(store.as_ref(), config).await?;
//!
//! session.set_tool(Tool::Erase);
//! session.on_pointer_down(StrokePoint::new(40.0, 40.0))?;
//! session.on_pointer_move(StrokePoint::new(90.0, 45.0))?;
//! session.on_pointer_up();
//! session.undo()?;
//!
//! std::fs::write("edited.png", session.export_png()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): Command-line interface and tracing subscriber setup
//! - `webp-support` (default): WebP decoding for uploads and backgrounds
//! - `tracing-json`: JSON log output for the CLI
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! imgly-bgedit = { version = "0.1", default-features = false }
//! ```

pub mod background;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod config;
pub mod error;
pub mod handle;
pub mod history;
pub mod mask;
pub mod postprocess;
pub mod processor;
pub mod script;
pub mod segmentation;
pub mod services;
pub mod session;
pub mod store;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;

// Public API exports
pub use background::{BackgroundSpec, HexColor};
pub use compositor::CompositePipeline;
pub use config::{EditorConfig, EditorConfigBuilder, ThresholdConfig, Tool, UploadLimits};
pub use error::{BgEditError, Result};
pub use handle::EditorHandle;
pub use history::HistoryStore;
pub use mask::MaskLayer;
pub use postprocess::MaskPostProcessor;
pub use processor::{CaptureConfig, CaptureProcessor, CaptureResult, CaptureTimings};
pub use script::{EditCommand, EditScript, ReplaySummary};
pub use segmentation::{PrecomputedMaskProvider, SegmentationProvider};
pub use services::ImageIOService;
pub use session::{EditSession, GestureState};
pub use store::{FileImageStore, ImageKey, ImageStore, MemoryImageStore};
pub use types::{CompositeFrame, HistoryEntry, Stroke, StrokePoint};
pub use utils::NumericValidator;

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};

/// Capture an upload into `store` and start an editing session on it
///
/// Convenience wrapper for single-process use: runs the capture step, then
/// loads the session from the same store. When the store rejects the capture
/// the session is built from the in-memory result instead.
///
/// # Errors
/// - Any capture error (`UnsupportedFormat`, `InputTooLarge`, `Decode`,
///   `ModelUnavailable`)
/// - `InvalidConfig` when `config` does not validate
pub async fn capture_and_edit(
    upload: &[u8],
    provider: std::sync::Arc<dyn SegmentationProvider>,
    store: std::sync::Arc<dyn ImageStore>,
    config: EditorConfig,
) -> Result<EditSession> {
    let capture_config = CaptureConfig {
        thresholds: config.thresholds,
        ..CaptureConfig::default()
    };
    let processor = CaptureProcessor::new(provider, store.clone(), capture_config)?;
    let result = processor.capture(upload).await?;

    if result.persisted {
        EditSession::load(store.as_ref(), config).await
    } else {
        let original = ImageIOService::decode_bytes(upload)?.to_rgba8();
        EditSession::from_images(&result.processed_image, Some(original), config)
    }
}
