//! Serializable edit commands
//!
//! A script is a JSON array of commands replayed against a session in order,
//! the same way a UI would drive it with pointer and toolbar events:
//!
//! ```json
//! [
//!   { "command": "set_tool", "tool": "erase" },
//!   { "command": "pointer_down", "x": 10.0, "y": 12.5 },
//!   { "command": "pointer_move", "x": 40.0, "y": 12.5 },
//!   { "command": "pointer_up" },
//!   { "command": "undo" }
//! ]
//! ```

use crate::{
    background::BackgroundSpec,
    config::Tool,
    error::{BgEditError, Result},
    session::EditSession,
    types::StrokePoint,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// One input or toolbar event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditCommand {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    PointerLeave,
    /// Shorthand for pointer-down, pointer-moves and pointer-up
    Stroke { points: Vec<StrokePoint> },
    Undo,
    Redo,
    SetTool { tool: Tool },
    SetBrushRadius { radius: u32 },
    SetBackgroundColor { color: String },
    ClearBackground,
}

impl EditCommand {
    /// Apply the command to `session`
    ///
    /// Undo and redo at the ends of history are no-ops, as in the UI.
    ///
    /// # Errors
    /// - `StrokeInProgress` for undo/redo between pointer-down and pointer-up
    /// - `InvalidConfig` for out-of-range radii and unparsable colors
    pub fn apply(&self, session: &mut EditSession) -> Result<()> {
        match self {
            Self::PointerDown { x, y } => session.on_pointer_down(StrokePoint::new(*x, *y)),
            Self::PointerMove { x, y } => session.on_pointer_move(StrokePoint::new(*x, *y)),
            Self::PointerUp => {
                session.on_pointer_up();
                Ok(())
            },
            Self::PointerLeave => {
                session.on_pointer_leave();
                Ok(())
            },
            Self::Stroke { points } => {
                let Some((first, rest)) = points.split_first() else {
                    return Ok(());
                };
                session.on_pointer_down(*first)?;
                for point in rest {
                    session.on_pointer_move(*point)?;
                }
                session.on_pointer_up();
                Ok(())
            },
            Self::Undo => session.undo().map(|_| ()),
            Self::Redo => session.redo().map(|_| ()),
            Self::SetTool { tool } => {
                session.set_tool(*tool);
                Ok(())
            },
            Self::SetBrushRadius { radius } => session.set_brush_radius(*radius),
            Self::SetBackgroundColor { color } => {
                session.set_background(BackgroundSpec::color(color)?)
            },
            Self::ClearBackground => session.set_background(BackgroundSpec::Transparent),
        }
    }
}

/// Counts reported after a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Commands applied
    pub applied: usize,
    /// History length after the last command
    pub history_len: usize,
}

/// Ordered list of commands
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditScript {
    pub commands: Vec<EditCommand>,
}

impl EditScript {
    #[must_use]
    pub fn new(commands: Vec<EditCommand>) -> Self {
        Self { commands }
    }

    /// Parse a script from JSON
    ///
    /// # Errors
    /// - `InvalidConfig` when the JSON is malformed or names unknown commands
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| BgEditError::invalid_config(format!("Invalid edit script: {}", e)))
    }

    /// Read and parse a script file
    ///
    /// # Errors
    /// - `Io` when the file cannot be read
    /// - `InvalidConfig` when its contents are not a valid script
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Serialize as pretty-printed JSON
    ///
    /// # Errors
    /// - `Internal` when serialization fails
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| BgEditError::internal(format!("Failed to serialize edit script: {}", e)))
    }

    /// Apply every command in order, stopping at the first failure
    ///
    /// A stroke left open by the script stays open; callers decide whether to
    /// end it.
    ///
    /// # Errors
    /// - The first error returned by [`EditCommand::apply`]
    pub fn replay(&self, session: &mut EditSession) -> Result<ReplaySummary> {
        for (index, command) in self.commands.iter().enumerate() {
            if let Err(e) = command.apply(session) {
                warn!(index, ?command, error = %e, "Edit script command failed");
                return Err(e);
            }
        }

        let summary = ReplaySummary {
            applied: self.commands.len(),
            history_len: session.history().len(),
        };
        debug!(applied = summary.applied, history_len = summary.history_len, "Replayed edit script");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn session() -> EditSession {
        let image = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
        let alpha = GrayImage::from_pixel(8, 8, Luma([255]));
        let config = EditorConfig::builder().brush_radius(1).build().unwrap();
        EditSession::new(image, &alpha, config).unwrap()
    }

    #[test]
    fn test_parse_tagged_commands() {
        let script = EditScript::from_json(
            r##"[
                {"command": "set_tool", "tool": "restore"},
                {"command": "pointer_down", "x": 1.5, "y": 2.0},
                {"command": "pointer_up"},
                {"command": "set_background_color", "color": "#ff0000"},
                {"command": "stroke", "points": [{"x": 0.5, "y": 0.5}]}
            ]"##,
        )
        .unwrap();

        assert_eq!(script.commands.len(), 5);
        assert_eq!(script.commands[0], EditCommand::SetTool { tool: Tool::Restore });
        assert_eq!(script.commands[1], EditCommand::PointerDown { x: 1.5, y: 2.0 });
        assert_eq!(script.commands[2], EditCommand::PointerUp);
    }

    #[test]
    fn test_unknown_command_rejected() {
        let err = EditScript::from_json(r#"[{"command": "smudge"}]"#).unwrap_err();
        assert!(matches!(err, BgEditError::InvalidConfig(_)));
        assert!(EditScript::from_json("not json").is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let script = EditScript::new(vec![
            EditCommand::SetBrushRadius { radius: 4 },
            EditCommand::Undo,
            EditCommand::ClearBackground,
        ]);
        assert_eq!(EditScript::from_json(&script.to_json().unwrap()).unwrap(), script);
    }

    #[test]
    fn test_replay_strokes_and_undo() {
        let mut session = session();
        let script = EditScript::new(vec![
            EditCommand::Stroke {
                points: vec![StrokePoint::new(0.5, 0.5), StrokePoint::new(3.5, 0.5)],
            },
            EditCommand::Stroke {
                points: vec![StrokePoint::new(0.5, 5.5)],
            },
            EditCommand::Undo,
        ]);

        let summary = script.replay(&mut session).unwrap();
        assert_eq!(summary.applied, 3);
        assert_eq!(summary.history_len, 3);
        assert_eq!(session.mask().alpha_at(2, 0), Some(0));
        assert_eq!(session.mask().alpha_at(0, 5), Some(255));
        assert!(session.can_redo());
    }

    #[test]
    fn test_replay_stops_on_undo_mid_stroke() {
        let mut session = session();
        let script = EditScript::new(vec![
            EditCommand::PointerDown { x: 1.0, y: 1.0 },
            EditCommand::Undo,
            EditCommand::PointerUp,
        ]);

        let err = script.replay(&mut session).unwrap_err();
        assert!(matches!(err, BgEditError::StrokeInProgress(_)));
        assert!(session.is_stroking());
    }

    #[test]
    fn test_background_commands() {
        let mut session = session();
        EditCommand::SetBackgroundColor {
            color: "#123456".to_string(),
        }
        .apply(&mut session)
        .unwrap();
        assert_eq!(session.config().background.kind(), "color");

        assert!(EditCommand::SetBackgroundColor {
            color: "blue-ish".to_string(),
        }
        .apply(&mut session)
        .is_err());
        assert_eq!(session.config().background.kind(), "color");

        EditCommand::ClearBackground.apply(&mut session).unwrap();
        assert_eq!(session.config().background, BackgroundSpec::Transparent);
    }
}
