//! Player capability surface
//!
//! Movement states never touch the world directly. Everything they need to
//! know about the actor's surroundings (aim, contacts, rope targets, the
//! jump buffer) comes through [`PlayerInfo`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub trait PlayerInfo {
    /// Current aim direction (not necessarily normalized; x drives walking)
    fn aim(&self) -> Vec2;

    /// Standing on something
    fn ground_check(&self) -> bool;

    /// +1 for a wall on the left, -1 for a wall on the right, 0 otherwise
    fn wall_check(&self) -> i32;

    /// Rope target along the snapped aim direction, if one is in reach
    fn grapple_raycast(&mut self) -> Option<Vec2>;

    /// Whether a jump was pressed recently; clears the buffer either way
    fn flush_jump_buffer(&mut self) -> bool;

    fn draw_rope(&mut self, _anchor: Vec2, _position: Vec2) {}

    fn show_rope(&mut self, _visible: bool) {}
}

/// Remembers the last jump press for a short window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JumpBuffer {
    last_press: Option<f32>,
}

impl JumpBuffer {
    pub fn record(&mut self, now: f32) {
        self.last_press = Some(now);
    }

    pub fn is_pending(&self, now: f32, window: f32) -> bool {
        self.last_press.is_some_and(|at| now - at <= window)
    }

    /// Consume the buffered press, reporting whether it was still fresh
    pub fn flush(&mut self, now: f32, window: f32) -> bool {
        let fresh = self.is_pending(now, window);
        self.last_press = None;
        fresh
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_buffer_window() {
        let mut buffer = JumpBuffer::default();
        assert!(!buffer.flush(0.0, 0.05));

        buffer.record(1.0);
        assert!(buffer.is_pending(1.04, 0.05));
        assert!(buffer.flush(1.04, 0.05));
        // Flushed
        assert!(!buffer.flush(1.04, 0.05));
    }

    #[test]
    fn test_jump_buffer_expires() {
        let mut buffer = JumpBuffer::default();
        buffer.record(1.0);
        assert!(!buffer.flush(1.2, 0.05));
        assert!(!buffer.is_pending(1.2, 0.05));
    }
}
