//! Pointer-driven column resizing.
//!
//! `ColumnResizeController` is a two-state machine, `Idle` and
//! `Dragging`. The global pointer stream is claimed through a
//! `PointerCapture` guard that lives inside the `Dragging` state, so it is
//! released on every exit path: `pointer_release`, or dropping the
//! controller when its owning view goes away.

use harmatch_domain::{ColumnKey, ColumnWidths, MIN_COLUMN_WIDTH};
use thiserror::Error;

use crate::ports::PointerCapture;

/// Resize contract violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResizeError {
    /// `begin_drag` was called while a drag was already active.
    #[error("a drag on column {0} is already active")]
    AlreadyDragging(ColumnKey),
}

/// Transient state of one drag, from press to release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    /// Column being resized.
    pub column: ColumnKey,
    /// Pointer x at press.
    pub start_pointer_x: i32,
    /// Column width at press.
    pub start_width: u32,
}

impl DragSession {
    /// Width for the column when the pointer is at `pointer_x`.
    #[must_use]
    pub fn width_at(&self, pointer_x: i32) -> u32 {
        let raw = i64::from(self.start_width) + i64::from(pointer_x)
            - i64::from(self.start_pointer_x);
        u32::try_from(raw.max(i64::from(MIN_COLUMN_WIDTH))).unwrap_or(u32::MAX)
    }
}

enum DragState<G> {
    Idle,
    Dragging { session: DragSession, _capture: G },
}

/// Owns the column widths and the single active drag session.
pub struct ColumnResizeController<P: PointerCapture> {
    widths: ColumnWidths,
    pointer: P,
    state: DragState<P::Guard>,
}

impl<P: PointerCapture> ColumnResizeController<P> {
    /// Creates an idle controller with default widths.
    pub fn new(pointer: P) -> Self {
        Self::with_widths(pointer, ColumnWidths::default())
    }

    /// Creates an idle controller with the given widths.
    pub const fn with_widths(pointer: P, widths: ColumnWidths) -> Self {
        Self {
            widths,
            pointer,
            state: DragState::Idle,
        }
    }

    /// Current widths.
    pub const fn widths(&self) -> &ColumnWidths {
        &self.widths
    }

    /// Active drag session, if any.
    pub const fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging { session, .. } => Some(session),
        }
    }

    /// Whether a drag is active.
    pub const fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Starts resizing `column` from pointer position `pointer_x`.
    ///
    /// # Errors
    ///
    /// Returns `ResizeError::AlreadyDragging` if a drag is active; the
    /// active session is left untouched.
    pub fn begin_drag(&mut self, column: ColumnKey, pointer_x: i32) -> Result<(), ResizeError> {
        if let DragState::Dragging { session, .. } = &self.state {
            return Err(ResizeError::AlreadyDragging(session.column));
        }
        let session = DragSession {
            column,
            start_pointer_x: pointer_x,
            start_width: self.widths.get(column),
        };
        self.state = DragState::Dragging {
            session,
            _capture: self.pointer.capture(),
        };
        Ok(())
    }

    /// Applies a pointer movement. Returns the new width of the dragged
    /// column, or `None` when idle.
    pub fn pointer_move(&mut self, pointer_x: i32) -> Option<u32> {
        let DragState::Dragging { session, .. } = &self.state else {
            return None;
        };
        let width = session.width_at(pointer_x);
        self.widths.set(session.column, width);
        Some(width)
    }

    /// Ends the drag and releases the pointer capture. Returns the
    /// finished session, or `None` when idle.
    pub fn pointer_release(&mut self) -> Option<DragSession> {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => None,
            DragState::Dragging { session, .. } => Some(session),
        }
    }
}
