//! Input model: modifier keys, mouse buttons, keys, and the gesture state machine.
//!
//! `Modifiers`, `Button` and `Key` describe a single event as the host reports
//! it. `InputState` is the gesture being tracked between pointer-down and
//! pointer-up, carrying what is needed to emit the final scene mutation on
//! release: the accumulated stroke points, or the drag origin.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::object::ObjectId;
use crate::tool::Brush;
use crate::viewport::Point;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key, named as the browser reports it (e.g. `"Delete"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `Delete` or `Backspace`.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self.0.as_str(), "Delete" | "Backspace")
    }

    /// Case-insensitive match on a single-character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        let mut chars = self.0.chars();
        matches!((chars.next(), chars.next()), (Some(k), None) if k.eq_ignore_ascii_case(&c))
    }
}

/// What a key press asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    DeleteActive,
    Undo,
    Redo,
}

/// Map a key press to an editor command.
#[must_use]
pub fn key_command(key: &Key, modifiers: Modifiers) -> Option<KeyCommand> {
    if key.is_delete() {
        return Some(KeyCommand::DeleteActive);
    }
    if !modifiers.command() {
        return None;
    }
    if key.is_char('y') || (key.is_char('z') && modifiers.shift) {
        Some(KeyCommand::Redo)
    } else if key.is_char('z') {
        Some(KeyCommand::Undo)
    } else {
        None
    }
}

/// Internal state for the gesture state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// A freehand stroke is being drawn. Nothing reaches the scene until release.
    Stroking {
        /// Points collected so far, in order.
        points: Vec<Point>,
        /// Brush captured at pointer-down.
        brush: Brush,
    },
    /// The user is moving an existing object across the canvas.
    DraggingObject {
        /// Id of the object being dragged.
        id: ObjectId,
        /// Pointer position at pointer-down.
        origin: Point,
        /// Pointer position at the previous event, used to compute deltas.
        last: Point,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
