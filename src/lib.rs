//! Grapple Motion - kinematic motion engine for a 2D grappling platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion curves, states, collisions, swing physics)
//! - `settings`: Data-driven movement and collision tuning

pub mod settings;
pub mod sim;

pub use settings::Tuning;

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Frame rate that frame-counted windows (coyote, jump buffer) are authored against
    pub const REFERENCE_FRAMERATE: f32 = 60.0;
    /// Default simulation timestep
    pub const SIM_DT: f32 = 1.0 / REFERENCE_FRAMERATE;

    /// Imaginary-part tolerance for accepting a complex root as real
    pub const ROOT_EPSILON: f64 = 1e-3;

    /// Maximum state hand-offs in a single machine update
    pub const MAX_TRANSITIONS_PER_UPDATE: usize = 16;

    /// Default actor bounding box (world units)
    pub const ACTOR_WIDTH: f32 = 0.8;
    pub const ACTOR_HEIGHT: f32 = 1.6;
}

/// Sign of `x`, with zero mapping to zero (unlike `f32::signum`)
#[inline]
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Signed angle in radians from `from` to `to`, counter-clockwise positive
#[inline]
pub fn signed_angle(from: Vec2, to: Vec2) -> f32 {
    from.perp_dot(to).atan2(from.dot(to))
}

/// Unit vector obtained by rotating straight down by `angle` radians (CCW)
///
/// Zero points down, positive angles swing toward +x.
#[inline]
pub fn rotate_from_down(angle: f32) -> Vec2 {
    Vec2::new(angle.sin(), -angle.cos())
}

/// Linear interpolation clamped to `t` in [0, 1]
#[inline]
pub fn lerp_clamped(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}
