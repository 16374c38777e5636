//! Gesture and cursor types for the manipulation state machine.
//!
//! `Gesture` is the state tracked between pointer-down and pointer-up. Each
//! active variant carries everything a pointer-move needs to recompute the
//! element from scratch, so intermediate moves never accumulate error.

use crate::geometry::{Handle, Point, Rect, Vec2};

/// The active pointer gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    /// No button held; pointer-moves only update the hover cursor.
    #[default]
    Idle,
    /// Moving the selected element.
    Dragging {
        id: String,
        /// Pointer position minus the element's top-left at pointer-down.
        offset: Vec2,
    },
    /// Resizing the selected element by one of its handles.
    Resizing {
        id: String,
        handle: Handle,
        /// Pointer position at pointer-down; every delta is taken against it.
        origin: Point,
        /// Element box at pointer-down.
        start: Rect,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

/// Hover feedback requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Move,
    Resize(Handle),
}

impl Cursor {
    /// CSS cursor keyword.
    pub fn css_name(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Move => "move",
            Cursor::Resize(Handle::Nw) => "nw-resize",
            Cursor::Resize(Handle::Ne) => "ne-resize",
            Cursor::Resize(Handle::Sw) => "sw-resize",
            Cursor::Resize(Handle::Se) => "se-resize",
            Cursor::Resize(Handle::N) => "n-resize",
            Cursor::Resize(Handle::S) => "s-resize",
            Cursor::Resize(Handle::W) => "w-resize",
            Cursor::Resize(Handle::E) => "e-resize",
        }
    }
}
