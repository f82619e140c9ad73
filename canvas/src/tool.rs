//! Tool modes and brush state.
//!
//! Exactly one of `Select`, `Draw`, `Erase` is active at any time, so Draw
//! and Erase can never both be on. Erasing is drawing with the background
//! color under subtractive compositing; it produces ordinary path objects.
//! The user's picked brush color is kept separately from the effective brush,
//! so an Erase session never overwrites it.

#[cfg(test)]
#[path = "tool_test.rs"]
mod tool_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{DEFAULT_BRUSH_COLOR, DEFAULT_BRUSH_WIDTH, MAX_BRUSH_WIDTH, MIN_BRUSH_WIDTH};
use crate::object::{Color, Compositing};

/// Which interaction mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    /// Pointer selects and drags objects (default).
    #[default]
    Select,
    /// Pointer draws freehand strokes in the picked color.
    Draw,
    /// Pointer paints the background color over existing objects.
    Erase,
}

impl ToolMode {
    /// Whether pointer input becomes a freehand stroke.
    #[must_use]
    pub fn is_freehand(self) -> bool {
        matches!(self, Self::Draw | Self::Erase)
    }
}

/// The brush a stroke is painted with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Color,
    pub width: f64,
    pub compositing: Compositing,
}

/// Mode machine plus the user's brush choices.
#[derive(Debug, Clone)]
pub struct ToolController {
    mode: ToolMode,
    picked_color: Color,
    width: f64,
}

impl Default for ToolController {
    fn default() -> Self {
        Self { mode: ToolMode::Select, picked_color: DEFAULT_BRUSH_COLOR, width: DEFAULT_BRUSH_WIDTH }
    }
}

impl ToolController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.mode == ToolMode::Draw
    }

    #[must_use]
    pub fn is_erasing(&self) -> bool {
        self.mode == ToolMode::Erase
    }

    // --- Transitions ---

    /// Switch to Draw, leaving Erase if it was on.
    pub fn enter_draw(&mut self) -> bool {
        self.transition(ToolMode::Draw)
    }

    /// Switch to Erase, leaving Draw if it was on.
    pub fn enter_erase(&mut self) -> bool {
        self.transition(ToolMode::Erase)
    }

    /// Turn both Draw and Erase off.
    pub fn enter_select(&mut self) -> bool {
        self.transition(ToolMode::Select)
    }

    /// Toolbar toggle: Draw on, or back to Select if Draw was already on.
    pub fn toggle_draw(&mut self) -> bool {
        if self.is_drawing() { self.enter_select() } else { self.enter_draw() }
    }

    /// Toolbar toggle: Erase on, or back to Select if Erase was already on.
    pub fn toggle_erase(&mut self) -> bool {
        if self.is_erasing() { self.enter_select() } else { self.enter_erase() }
    }

    /// Returns whether the mode changed.
    fn transition(&mut self, next: ToolMode) -> bool {
        if self.mode == next {
            return false;
        }
        debug!(from = ?self.mode, to = ?next, "tool mode changed");
        self.mode = next;
        true
    }

    // --- Brush ---

    pub fn set_brush_color(&mut self, color: Color) {
        self.picked_color = color;
    }

    /// Set the brush width, clamped to the slider range. Non-finite widths are ignored.
    pub fn set_brush_width(&mut self, width: f64) {
        if width.is_finite() {
            self.width = width.clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH);
        }
    }

    /// The color the user last picked, regardless of mode.
    #[must_use]
    pub fn picked_color(&self) -> Color {
        self.picked_color
    }

    #[must_use]
    pub fn brush_width(&self) -> f64 {
        self.width
    }

    /// The brush in effect: the picked color normally, the background under
    /// subtractive compositing while erasing.
    #[must_use]
    pub fn brush(&self, background: Color) -> Brush {
        match self.mode {
            ToolMode::Erase => Brush { color: background, width: self.width, compositing: Compositing::Subtractive },
            ToolMode::Select | ToolMode::Draw => {
                Brush { color: self.picked_color, width: self.width, compositing: Compositing::Normal }
            }
        }
    }
}
