//! Frame-coherent pointer state for mouse drags.
//!
//! [`PointerState`] accumulates winit cursor events during a frame. Movement
//! counts as drag only while the left button is held.

use glam::Vec2;
use winit::event::{ElementState, MouseButton};

/// Mouse position and left-button drag tracking.
///
/// 1. Forward winit events via the `on_*` methods.
/// 2. Read [`drag_delta`](Self::drag_delta) once per frame.
/// 3. Call [`clear_transients`](Self::clear_transients) at end of frame.
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    position: Vec2,
    has_position: bool,
    dragging: bool,
    drag_delta: Vec2,
}

impl PointerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Event handlers ──────────────────────────────────────────────

    /// Process a `CursorMoved` event (logical pixels).
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        if self.dragging && self.has_position {
            self.drag_delta += new_pos - self.position;
        }
        self.position = new_pos;
        self.has_position = true;
    }

    /// Process a `MouseInput` event. Only the left button drags.
    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        self.dragging = state == ElementState::Pressed;
    }

    /// Leaving the window ends any drag; the release would not be delivered.
    pub fn on_cursor_left(&mut self) {
        self.dragging = false;
        self.has_position = false;
    }

    /// Window lost focus: a held button will never report its release.
    pub fn on_focus_lost(&mut self) {
        self.dragging = false;
    }

    /// Clears the per-frame drag delta.
    pub fn clear_transients(&mut self) {
        self.drag_delta = Vec2::ZERO;
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Drag movement accumulated since the last clear.
    #[must_use]
    pub fn drag_delta(&self) -> Vec2 {
        self.drag_delta
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}
