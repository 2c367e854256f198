//! Movement parameters
//!
//! Designers author heights, distances and frame counts. Everything the
//! integrators need (gravities, launch velocities, accelerations) is derived
//! on demand. Grapple-launched jumps use modified copies that carry an
//! explicit override list on top of a value copy of the base.

use serde::{Deserialize, Serialize};

use crate::consts::REFERENCE_FRAMERATE;
use crate::lerp_clamped;

/// Named fields a modified parameter set may replace
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterOverrides {
    pub top_speed: Option<f32>,
    pub acceleration: Option<f32>,
    pub deceleration: Option<f32>,
    pub max_jump_height: Option<f32>,
    pub max_jump_distance: Option<f32>,
    pub max_horizontal_jump_speed: Option<f32>,
    pub jump_duration: Option<f32>,
}

impl ParameterOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Designer-facing movement tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementParameters {
    // === Walking ===
    /// Horizontal top speed (units/s)
    pub top_speed: f32,
    /// Distance covered while accelerating from rest to top speed
    pub acceleration_distance: f32,
    /// Distance covered while braking from top speed to rest
    pub deceleration_distance: f32,

    // === Jumping ===
    pub max_jump_height: f32,
    pub min_jump_height: f32,
    /// Horizontal distance of a full-height jump at top speed
    pub max_jump_distance: f32,
    /// Extra rise allowed after the jump button is released
    pub cancelled_jump_rise: f32,
    /// Fraction of the jump spent rising
    pub rise_ratio: f32,
    pub coyote_frames: f32,
    pub jump_buffer_frames: f32,

    // === Walls ===
    /// Height gained (or lost, if negative) by a wall jump back onto the same wall
    pub climb_height: f32,
    /// Wall contact grace, in pixels
    pub grace_pixels: f32,
    pub pixels_per_unit: f32,
    /// Wall slide speed as a fraction of terminal velocity
    pub wall_slide_velocity_factor: f32,

    // === Rope ===
    pub rope_length: f32,
    /// Aim directions the rope snaps to per full turn
    pub angle_subdivisions: u32,
    /// Shortest rope, as a fraction of `rope_length`
    pub min_rope_length_factor: f32,
    /// Swing drive (degrees/s²)
    pub angular_acceleration: f32,
    /// Highest driven swing peak (degrees)
    pub max_swing_angle: f32,
    /// Swings until an undriven pendulum visibly stops
    pub dead_swing_count: f32,
    /// Peak angle of a wall push-off swing (degrees)
    pub wall_swing_max_angle: f32,

    // === Grapple ===
    pub grapple_speed: f32,
    /// Distance over which impact speed decays back to top speed
    pub impact_distance: f32,
    pub impact_speed: f32,
    pub max_grapple_wall_jump_height: f32,
    pub max_vertical_grapple_jump_height: f32,

    #[serde(skip)]
    pub overrides: ParameterOverrides,
}

impl Default for MovementParameters {
    fn default() -> Self {
        Self {
            top_speed: 10.0,
            acceleration_distance: 0.5,
            deceleration_distance: 0.5,

            max_jump_height: 4.0,
            min_jump_height: 2.0,
            max_jump_distance: 6.0,
            cancelled_jump_rise: 0.75,
            rise_ratio: 0.583_333_3,
            coyote_frames: 4.0,
            jump_buffer_frames: 3.0,

            climb_height: 0.0,
            grace_pixels: 2.0,
            pixels_per_unit: 16.0,
            wall_slide_velocity_factor: 0.15,

            rope_length: 7.5,
            angle_subdivisions: 8,
            min_rope_length_factor: 0.75,
            angular_acceleration: 180.0,
            max_swing_angle: 45.0,
            dead_swing_count: 40.0,
            wall_swing_max_angle: 90.0,

            grapple_speed: 10.0,
            impact_distance: 0.6,
            impact_speed: 20.0,
            max_grapple_wall_jump_height: 6.0,
            max_vertical_grapple_jump_height: 7.0,

            overrides: ParameterOverrides::default(),
        }
    }
}

fn acceleration_for(top_speed: f32, distance: f32) -> f32 {
    if distance <= 0.0 {
        return f32::INFINITY;
    }
    0.5 * top_speed * top_speed / distance
}

impl MovementParameters {
    /// Whether the authored values can produce finite motion
    pub fn is_valid(&self) -> bool {
        let positive = [
            self.top_speed,
            self.acceleration_distance,
            self.deceleration_distance,
            self.max_jump_height,
            self.max_jump_distance,
            self.rope_length,
            self.grapple_speed,
            self.impact_distance,
            self.pixels_per_unit,
            self.dead_swing_count,
        ];
        positive.iter().all(|v| v.is_finite() && *v > 0.0)
            && self.rise_ratio > 0.0
            && self.rise_ratio < 1.0
            && self.min_jump_height <= self.max_jump_height
            && self.impact_speed > self.top_speed
            && self.angle_subdivisions > 0
    }

    /// Same values with every override cleared
    pub fn base(&self) -> Self {
        Self {
            overrides: ParameterOverrides::default(),
            ..*self
        }
    }

    /// Value copy of the base with `overrides` applied on top
    pub fn with_overrides(&self, overrides: ParameterOverrides) -> Self {
        Self {
            overrides,
            ..*self
        }
    }

    pub fn is_modified(&self) -> bool {
        !self.overrides.is_empty()
    }

    // === Walking ===

    pub fn top_speed(&self) -> f32 {
        self.overrides.top_speed.unwrap_or(self.top_speed)
    }

    pub fn acceleration(&self) -> f32 {
        self.overrides
            .acceleration
            .unwrap_or_else(|| acceleration_for(self.top_speed(), self.acceleration_distance))
    }

    pub fn deceleration(&self) -> f32 {
        self.overrides
            .deceleration
            .unwrap_or_else(|| acceleration_for(self.top_speed(), self.deceleration_distance))
    }

    // === Jumping ===

    pub fn max_jump_height(&self) -> f32 {
        self.overrides.max_jump_height.unwrap_or(self.max_jump_height)
    }

    pub fn max_jump_distance(&self) -> f32 {
        self.overrides
            .max_jump_distance
            .unwrap_or(self.max_jump_distance)
    }

    pub fn max_horizontal_jump_speed(&self) -> f32 {
        self.overrides
            .max_horizontal_jump_speed
            .unwrap_or_else(|| self.top_speed())
    }

    pub fn jump_duration(&self) -> f32 {
        self.overrides
            .jump_duration
            .unwrap_or_else(|| self.max_jump_distance() / self.max_horizontal_jump_speed())
    }

    pub fn rise_time(&self) -> f32 {
        self.rise_ratio * self.jump_duration()
    }

    pub fn fall_time(&self) -> f32 {
        (1.0 - self.rise_ratio) * self.jump_duration()
    }

    pub fn rise_distance(&self) -> f32 {
        self.rise_ratio * self.max_jump_distance()
    }

    pub fn fall_distance(&self) -> f32 {
        (1.0 - self.rise_ratio) * self.max_jump_distance()
    }

    pub fn rise_gravity(&self) -> f32 {
        let rise = self.rise_time();
        2.0 * self.max_jump_height() / (rise * rise)
    }

    pub fn fall_gravity(&self) -> f32 {
        let fall = self.fall_time();
        2.0 * self.max_jump_height() / (fall * fall)
    }

    pub fn jump_velocity(&self) -> f32 {
        2.0 * self.max_jump_height() / self.rise_time()
    }

    pub fn terminal_velocity(&self) -> f32 {
        2.0 * self.max_jump_height() / self.fall_time()
    }

    pub fn coyote_time(&self) -> f32 {
        self.coyote_frames / REFERENCE_FRAMERATE
    }

    pub fn jump_buffer_duration(&self) -> f32 {
        self.jump_buffer_frames / REFERENCE_FRAMERATE
    }

    // === Walls ===

    pub fn wall_slide_velocity(&self) -> f32 {
        self.wall_slide_velocity_factor * self.terminal_velocity()
    }

    /// How far past a side face a wall still counts as touching
    pub fn wall_check_overlap(&self) -> f32 {
        self.grace_pixels / self.pixels_per_unit
    }

    // === Rope ===

    /// Aim snapping step, in degrees
    pub fn angle_snap_increment(&self) -> f32 {
        360.0 / self.angle_subdivisions.max(1) as f32
    }

    pub fn min_rope_length(&self) -> f32 {
        self.min_rope_length_factor * self.rope_length
    }

    // === Grapple ===

    pub fn impact_duration(&self) -> f32 {
        2.0 * self.impact_distance / (self.impact_speed + self.top_speed())
    }

    /// Signed rate at which impact speed decays toward top speed
    pub fn impact_acceleration(&self) -> f32 {
        (self.top_speed() - self.impact_speed) / self.impact_duration()
    }

    // === Modified sets ===

    /// Ground jump launched out of an impact at horizontal speed `launch_speed`.
    ///
    /// Horizontal reach scales with launch speed while the jump keeps the
    /// duration of a jump taken at impact speed.
    pub fn grapple_jump(&self, launch_speed: f32) -> Self {
        let base = self.base();
        let scale = launch_speed.abs() / base.top_speed;
        base.with_overrides(ParameterOverrides {
            top_speed: Some(launch_speed.abs()),
            acceleration: Some(acceleration_for(
                base.impact_speed,
                scale * base.acceleration_distance,
            )),
            deceleration: Some(acceleration_for(
                base.impact_speed,
                scale * base.deceleration_distance,
            )),
            max_jump_distance: Some(scale * base.max_jump_distance),
            max_horizontal_jump_speed: Some(base.impact_speed),
            ..Default::default()
        })
    }

    /// Wall jump launched out of an impact at speed `speed`.
    ///
    /// Jump height grows with the impact boost up to
    /// `max_grapple_wall_jump_height`; gravities match the base jump.
    pub fn grapple_wall_jump(&self, speed: f32) -> Self {
        let base = self.base();
        let boost = (speed - base.top_speed) / (base.impact_speed - base.top_speed);
        let height = lerp_clamped(
            base.max_jump_height,
            base.max_grapple_wall_jump_height,
            boost,
        );
        let duration = base.scaled_jump_duration(height);
        let top_speed = base.max_jump_distance / duration;
        let scale = top_speed / base.top_speed;
        base.with_overrides(ParameterOverrides {
            top_speed: Some(top_speed),
            acceleration: Some(acceleration_for(
                top_speed,
                scale * base.acceleration_distance,
            )),
            deceleration: Some(acceleration_for(
                top_speed,
                scale * base.deceleration_distance,
            )),
            max_jump_height: Some(height),
            jump_duration: Some(duration),
            ..Default::default()
        })
    }

    /// Jump off the top of a vertical grapple
    pub fn vertical_grapple_jump(&self) -> Self {
        let base = self.base();
        let height = base.max_vertical_grapple_jump_height;
        base.with_overrides(ParameterOverrides {
            max_jump_height: Some(height),
            jump_duration: Some(base.scaled_jump_duration(height)),
            ..Default::default()
        })
    }

    /// Duration of a jump to `height` under the base rise and fall gravities
    fn scaled_jump_duration(&self, height: f32) -> f32 {
        let rise = (2.0 * height / self.rise_gravity()).sqrt();
        let fall = (2.0 * height / self.fall_gravity()).sqrt();
        rise + fall
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_derivations() {
        let p = MovementParameters::default();
        assert!(p.is_valid());
        assert!((p.jump_duration() - 0.6).abs() < 1e-5);
        assert!((p.rise_time() - 0.35).abs() < 1e-4);
        assert!((p.fall_time() - 0.25).abs() < 1e-4);
        assert!((p.fall_gravity() - 128.0).abs() < 0.1);
        assert!((p.rise_gravity() - 65.306).abs() < 0.1);
        assert!((p.jump_velocity() - 22.857).abs() < 0.01);
        assert!((p.terminal_velocity() - 32.0).abs() < 0.01);
        assert!((p.acceleration() - 100.0).abs() < 1e-3);
        assert!((p.wall_slide_velocity() - 4.8).abs() < 1e-3);
        assert!((p.coyote_time() - 4.0 / 60.0).abs() < 1e-6);
        assert!((p.angle_snap_increment() - 45.0).abs() < 1e-6);
        assert!(p.impact_acceleration() < 0.0);
    }

    #[test]
    fn test_jump_velocity_reaches_max_height() {
        let p = MovementParameters::default();
        let v = p.jump_velocity();
        let h = v * v / (2.0 * p.rise_gravity());
        assert!((h - p.max_jump_height).abs() < 1e-3);
    }

    #[test]
    fn test_overrides_preserve_other_fields() {
        let base = MovementParameters::default();
        let modified = base.with_overrides(ParameterOverrides {
            top_speed: Some(15.0),
            ..Default::default()
        });
        assert_eq!(modified.top_speed(), 15.0);
        assert_eq!(modified.max_jump_height(), base.max_jump_height());
        assert_eq!(modified.rope_length, base.rope_length);
        assert_eq!(modified.base(), base);
    }

    #[test]
    fn test_modified_set_is_a_value_copy() {
        let mut base = MovementParameters::default();
        let jump = base.grapple_jump(15.0);
        base.max_jump_height = 100.0;
        assert_eq!(jump.max_jump_height(), 4.0);
    }

    #[test]
    fn test_grapple_jump_scales_reach() {
        let base = MovementParameters::default();
        let jump = base.grapple_jump(15.0);
        assert!((jump.max_jump_distance() - 9.0).abs() < 1e-4);
        assert_eq!(jump.max_horizontal_jump_speed(), base.impact_speed);
        assert!((jump.jump_duration() - 9.0 / 20.0).abs() < 1e-5);
        assert_eq!(jump.top_speed(), 15.0);

        // Top speed starts at the launch speed, even below the base value
        assert_eq!(base.grapple_jump(-6.0).top_speed(), 6.0);
    }

    #[test]
    fn test_grapple_wall_jump_keeps_gravity() {
        let base = MovementParameters::default();
        let wall = base.grapple_wall_jump(base.impact_speed);
        assert!((wall.max_jump_height() - base.max_grapple_wall_jump_height).abs() < 1e-5);
        assert!((wall.rise_gravity() - base.rise_gravity()).abs() < 0.05);
        assert!((wall.fall_gravity() - base.fall_gravity()).abs() < 0.05);

        let slow = base.grapple_wall_jump(base.top_speed);
        assert!((slow.max_jump_height() - base.max_jump_height).abs() < 1e-5);
        assert!((slow.top_speed() - base.top_speed).abs() < 1e-3);
    }

    #[test]
    fn test_vertical_grapple_jump_height() {
        let base = MovementParameters::default();
        let v = base.vertical_grapple_jump();
        let vel = v.jump_velocity();
        let h = vel * vel / (2.0 * v.rise_gravity());
        assert!((h - base.max_vertical_grapple_jump_height).abs() < 1e-3);
        assert!((v.rise_gravity() - base.rise_gravity()).abs() < 0.05);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let p: MovementParameters = serde_json::from_str(r#"{"top_speed": 12.0}"#)
            .expect("partial parameters should parse");
        assert_eq!(p.top_speed, 12.0);
        assert_eq!(p.rope_length, 7.5);
        assert!(!p.is_modified());
    }
}
