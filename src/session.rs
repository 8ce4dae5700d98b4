//! Editing session: gesture state machine over mask, history and compositor
//!
//! An `EditSession` owns everything a single edit needs: the pixel source,
//! the editable mask, the undo/redo history, the active configuration and the
//! latest rendered frame. Input adapters drive it with pointer events:
//!
//! - pointer-down while idle starts a stroke and paints a dot immediately
//! - pointer-move while stroking extends the stroke and re-renders
//! - pointer-up or pointer-leave ends the stroke and commits a snapshot
//!
//! Undo and redo are rejected while a stroke is in progress so an unfinished
//! edit is never silently dropped.

use crate::{
    background::BackgroundSpec,
    compositor::CompositePipeline,
    config::{validate_brush_radius, EditorConfig, Tool},
    error::{BgEditError, Result},
    history::HistoryStore,
    mask::MaskLayer,
    postprocess::MaskPostProcessor,
    services::ImageIOService,
    store::{ImageKey, ImageStore},
    types::{CompositeFrame, Stroke, StrokePoint},
    utils::NumericValidator,
};
use image::{imageops, imageops::FilterType, GrayImage, RgbaImage};
use tracing::{debug, info, instrument, trace, warn};

/// Pointer gesture state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    /// No pointer held
    #[default]
    Idle,
    /// A stroke is being drawn
    Stroking {
        /// Samples collected so far, with the tool and radius captured at start
        stroke: Stroke,
    },
}

/// One image being edited
#[derive(Debug, Clone)]
pub struct EditSession {
    image: RgbaImage,
    mask: MaskLayer,
    history: HistoryStore,
    config: EditorConfig,
    gesture: GestureState,
    frame: CompositeFrame,
}

impl EditSession {
    /// Start a session from a pixel source and a raw alpha grid
    ///
    /// The raw alpha is cleaned with the configured thresholds before it
    /// becomes the initial mask, which is committed as the first history entry.
    ///
    /// # Errors
    /// - `InvalidConfig` when `config` does not validate
    /// - `Processing` when the alpha grid and image sizes differ
    pub fn new(image: RgbaImage, raw_alpha: &GrayImage, config: EditorConfig) -> Result<Self> {
        config.validate()?;
        NumericValidator::validate_same_dimensions(image.dimensions(), raw_alpha.dimensions(), "Mask")?;

        let processor = MaskPostProcessor::new(config.thresholds)?;
        let mask = MaskLayer::from_alpha(processor.process(raw_alpha));
        Self::assemble(image, mask, config)
    }

    /// Start a session from the capture step's images
    ///
    /// The mask comes from `processed`'s alpha channel. `original` is the
    /// pixel source when present; otherwise `processed` supplies its own
    /// pixels. An original of a different size is resized to match.
    ///
    /// # Errors
    /// - `InvalidConfig` when `config` does not validate
    pub fn from_images(
        processed: &RgbaImage,
        original: Option<RgbaImage>,
        config: EditorConfig,
    ) -> Result<Self> {
        config.validate()?;

        let processor = MaskPostProcessor::new(config.thresholds)?;
        let mask = MaskLayer::from_alpha(processor.process_alpha(processed));

        let (width, height) = processed.dimensions();
        let image = match original {
            Some(original) if original.dimensions() == (width, height) => original,
            Some(original) => {
                warn!(
                    original_width = original.width(),
                    original_height = original.height(),
                    width,
                    height,
                    "Original image size differs from processed image, resizing"
                );
                imageops::resize(&original, width, height, FilterType::Lanczos3)
            },
            None => processed.clone(),
        };

        Self::assemble(image, mask, config)
    }

    /// Start a session from the image store
    ///
    /// Reads `processed_image` (required) and `original_image` (optional).
    ///
    /// # Errors
    /// - `InvalidConfig` when `config` does not validate
    /// - `MissingInput` when no processed image is stored
    /// - `Decode` when a stored image cannot be decoded
    /// - Any error the store reports on read
    #[instrument(skip(store, config), fields(store = %store.describe()))]
    pub async fn load(store: &dyn ImageStore, config: EditorConfig) -> Result<Self> {
        config.validate()?;

        let processed_bytes = store.get(ImageKey::ProcessedImage).await?.ok_or_else(|| {
            BgEditError::missing_input(format!(
                "'{}' not found in the image store, upload an image first",
                ImageKey::ProcessedImage
            ))
        })?;
        let processed = ImageIOService::decode_bytes(&processed_bytes)?.to_rgba8();

        let original = match store.get(ImageKey::OriginalImage).await? {
            Some(bytes) => Some(ImageIOService::decode_bytes(&bytes)?.to_rgba8()),
            None => None,
        };
        let has_original = original.is_some();

        let session = Self::from_images(&processed, original, config)?;
        let (width, height) = session.dimensions();
        info!(width, height, has_original, "Edit session started");
        Ok(session)
    }

    fn assemble(image: RgbaImage, mask: MaskLayer, config: EditorConfig) -> Result<Self> {
        let mut history = HistoryStore::new(config.history_capacity)?;
        history.commit(mask.snapshot());
        let frame = CompositePipeline::render(&image, &mask, &config.background)?;

        Ok(Self {
            image,
            mask,
            history,
            config,
            gesture: GestureState::Idle,
            frame,
        })
    }

    /// Begin a stroke at `point`
    ///
    /// Ignored while a stroke is already in progress.
    ///
    /// # Errors
    /// - `Processing` when the frame cannot be recomposed
    pub fn on_pointer_down(&mut self, point: StrokePoint) -> Result<()> {
        if self.is_stroking() {
            trace!("Pointer down while stroking, ignoring");
            return Ok(());
        }

        let stroke = Stroke::new(self.config.tool, self.config.brush_radius, point);
        self.mask
            .apply_segment(point, point, stroke.radius, stroke.tool);
        self.gesture = GestureState::Stroking { stroke };
        self.render()?;
        Ok(())
    }

    /// Extend the current stroke to `point`
    ///
    /// Ignored while idle (hover).
    ///
    /// # Errors
    /// - `Processing` when the frame cannot be recomposed
    pub fn on_pointer_move(&mut self, point: StrokePoint) -> Result<()> {
        let GestureState::Stroking { stroke } = &mut self.gesture else {
            return Ok(());
        };

        if let Some(last) = stroke.last_point() {
            self.mask
                .apply_segment(last, point, stroke.radius, stroke.tool);
        }
        stroke.push(point);
        self.render()?;
        Ok(())
    }

    /// End the current stroke and commit it to history
    ///
    /// Returns whether a stroke was committed; duplicate releases are no-ops.
    pub fn on_pointer_up(&mut self) -> bool {
        match std::mem::take(&mut self.gesture) {
            GestureState::Stroking { stroke } => {
                self.history.commit(self.mask.snapshot());
                debug!(
                    tool = %stroke.tool,
                    radius = stroke.radius,
                    points = stroke.points.len(),
                    history_len = self.history.len(),
                    "Committed stroke"
                );
                true
            },
            GestureState::Idle => false,
        }
    }

    /// Pointer left the canvas; the partial stroke is kept and committed
    pub fn on_pointer_leave(&mut self) -> bool {
        self.on_pointer_up()
    }

    /// Step back one history entry
    ///
    /// Returns `false` when already at the oldest retained entry.
    ///
    /// # Errors
    /// - `StrokeInProgress` while a stroke is being drawn
    pub fn undo(&mut self) -> Result<bool> {
        self.ensure_idle("undo")?;
        match self.history.undo() {
            Some(entry) => self.mask.restore_from(entry)?,
            None => return Ok(false),
        }
        self.render()?;
        Ok(true)
    }

    /// Step forward one history entry
    ///
    /// Returns `false` when there is nothing to redo.
    ///
    /// # Errors
    /// - `StrokeInProgress` while a stroke is being drawn
    pub fn redo(&mut self) -> Result<bool> {
        self.ensure_idle("redo")?;
        match self.history.redo() {
            Some(entry) => self.mask.restore_from(entry)?,
            None => return Ok(false),
        }
        self.render()?;
        Ok(true)
    }

    fn ensure_idle(&self, operation: &str) -> Result<()> {
        if self.is_stroking() {
            return Err(BgEditError::stroke_in_progress(format!(
                "cannot {} until the current stroke ends",
                operation
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.is_stroking() && self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.is_stroking() && self.history.can_redo()
    }

    /// Select the tool for the next stroke
    pub fn set_tool(&mut self, tool: Tool) {
        self.config.tool = tool;
    }

    /// Set the brush radius for the next stroke
    ///
    /// # Errors
    /// - `InvalidConfig` when outside 1-100; the previous radius stays
    pub fn set_brush_radius(&mut self, radius: u32) -> Result<()> {
        self.config.brush_radius = validate_brush_radius(radius)?;
        Ok(())
    }

    /// Replace the background and re-render
    ///
    /// # Errors
    /// - `Processing` when the frame cannot be recomposed; the new background
    ///   stays selected
    pub fn set_background(&mut self, background: BackgroundSpec) -> Result<()> {
        self.config.background = background;
        self.render()?;
        Ok(())
    }

    /// Recompose the frame from the current mask and background
    pub fn render(&mut self) -> Result<&CompositeFrame> {
        self.frame = CompositePipeline::render(&self.image, &self.mask, &self.config.background)?;
        Ok(&self.frame)
    }

    /// Latest rendered frame
    #[must_use]
    pub fn frame(&self) -> &CompositeFrame {
        &self.frame
    }

    /// Encode the latest rendered frame as PNG
    pub fn export_png(&self) -> Result<Vec<u8>> {
        self.frame.to_png_bytes()
    }

    #[must_use]
    pub fn is_stroking(&self) -> bool {
        matches!(self.gesture, GestureState::Stroking { .. })
    }

    #[must_use]
    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn mask(&self) -> &MaskLayer {
        &self.mask
    }

    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Pixel source the subject is cut from
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Canvas dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
