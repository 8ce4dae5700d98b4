//! Thread-safe access to an editing session
//!
//! `EditorHandle` is a cloneable handle around a single mutex that guards the
//! whole session. Every operation holds the lock for its entire
//! apply-render-commit cycle, so a reader never observes a half-applied
//! stroke or a history longer than its capacity. Until a session is installed
//! every operation fails with `NotInitialized`; nothing is queued.

use crate::{
    background::BackgroundSpec,
    config::{EditorConfig, Tool},
    error::{BgEditError, Result},
    session::EditSession,
    store::ImageStore,
    types::{CompositeFrame, StrokePoint},
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;

/// Shared handle to an optional editing session
#[derive(Debug, Clone, Default)]
pub struct EditorHandle {
    inner: Arc<Mutex<Option<EditSession>>>,
}

impl EditorHandle {
    /// Create a handle with no session yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a session from `store` and install it
    ///
    /// Loading happens outside the lock; the finished session replaces any
    /// previous one atomically. On failure the previous session, if any, is
    /// left untouched.
    ///
    /// # Errors
    /// - Any error from [`EditSession::load`]
    #[instrument(skip_all)]
    pub async fn initialize(&self, store: &dyn ImageStore, config: EditorConfig) -> Result<()> {
        let session = EditSession::load(store, config).await?;
        self.install(session)
    }

    /// Install an already-built session
    pub fn install(&self, session: EditSession) -> Result<()> {
        *self.lock()? = Some(session);
        Ok(())
    }

    /// Whether a session has been installed
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.lock().is_ok_and(|guard| guard.is_some())
    }

    /// Run `operation` against the session while holding the lock
    ///
    /// # Errors
    /// - `NotInitialized` before a session is installed
    /// - `Internal` when a previous holder panicked
    /// - Whatever `operation` returns
    pub fn with_session<T>(
        &self,
        operation: impl FnOnce(&mut EditSession) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.lock()?;
        let session = guard
            .as_mut()
            .ok_or_else(|| BgEditError::not_initialized("no image has been loaded for editing"))?;
        operation(session)
    }

    pub fn pointer_down(&self, point: StrokePoint) -> Result<()> {
        self.with_session(|session| session.on_pointer_down(point))
    }

    pub fn pointer_move(&self, point: StrokePoint) -> Result<()> {
        self.with_session(|session| session.on_pointer_move(point))
    }

    pub fn pointer_up(&self) -> Result<bool> {
        self.with_session(|session| Ok(session.on_pointer_up()))
    }

    pub fn pointer_leave(&self) -> Result<bool> {
        self.with_session(|session| Ok(session.on_pointer_leave()))
    }

    pub fn undo(&self) -> Result<bool> {
        self.with_session(EditSession::undo)
    }

    pub fn redo(&self) -> Result<bool> {
        self.with_session(EditSession::redo)
    }

    /// Undo/redo availability as `(can_undo, can_redo)`
    pub fn history_state(&self) -> Result<(bool, bool)> {
        self.with_session(|session| Ok((session.can_undo(), session.can_redo())))
    }

    pub fn set_tool(&self, tool: Tool) -> Result<()> {
        self.with_session(|session| {
            session.set_tool(tool);
            Ok(())
        })
    }

    pub fn set_brush_radius(&self, radius: u32) -> Result<()> {
        self.with_session(|session| session.set_brush_radius(radius))
    }

    pub fn set_background(&self, background: BackgroundSpec) -> Result<()> {
        self.with_session(|session| session.set_background(background))
    }

    /// Copy of the latest rendered frame
    pub fn frame(&self) -> Result<CompositeFrame> {
        self.with_session(|session| Ok(session.frame().clone()))
    }

    /// Latest rendered frame encoded as PNG
    pub fn export_png(&self) -> Result<Vec<u8>> {
        self.with_session(|session| session.export_png())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<EditSession>>> {
        self.inner
            .lock()
            .map_err(|_| BgEditError::internal("Editor session lock poisoned"))
    }
}
