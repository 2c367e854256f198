//! Kinematic primitives
//!
//! Motion is described exactly as a sequence of constant-acceleration
//! segments. The integrators here advance a [`KinematicState`] in place,
//! consume simulated time from a shared budget `t`, and return the segment
//! covering the interval they consumed.

use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Quantity that can be integrated: scalars for a single axis, vectors for the plane
pub trait Kinematic:
    Copy + Debug + PartialEq + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
    const ZERO: Self;
}

impl Kinematic for f32 {
    const ZERO: Self = 0.0;
}

impl Kinematic for Vec2 {
    const ZERO: Self = Vec2::ZERO;
}

/// Position and velocity at an instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicState<T> {
    pub position: T,
    pub velocity: T,
}

impl<T: Kinematic> KinematicState<T> {
    pub fn new(position: T, velocity: T) -> Self {
        Self { position, velocity }
    }

    /// State after moving for `t` under constant `acceleration`
    pub fn integrated(&self, acceleration: T, t: f32) -> Self {
        Self {
            position: self.position + self.velocity * t + acceleration * (0.5 * t * t),
            velocity: self.velocity + acceleration * t,
        }
    }
}

impl KinematicState<Vec2> {
    pub fn x(&self) -> KinematicState<f32> {
        KinematicState::new(self.position.x, self.velocity.x)
    }

    pub fn y(&self) -> KinematicState<f32> {
        KinematicState::new(self.position.y, self.velocity.y)
    }

    pub fn from_axes(x: KinematicState<f32>, y: KinematicState<f32>) -> Self {
        Self::new(
            Vec2::new(x.position, y.position),
            Vec2::new(x.velocity, y.velocity),
        )
    }
}

/// Exact motion under constant acceleration for `duration` seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicSegment<T> {
    pub initial: KinematicState<T>,
    pub acceleration: T,
    pub duration: f32,
}

impl<T: Kinematic> KinematicSegment<T> {
    pub fn new(initial: KinematicState<T>, acceleration: T, duration: f32) -> Self {
        Self {
            initial,
            acceleration,
            duration,
        }
    }

    pub fn position_at(&self, t: f32) -> T {
        self.initial.integrated(self.acceleration, t).position
    }

    pub fn velocity_at(&self, t: f32) -> T {
        self.initial.velocity + self.acceleration * t
    }

    pub fn final_state(&self) -> KinematicState<T> {
        self.initial.integrated(self.acceleration, self.duration)
    }

    /// Drop the first `dt` seconds of the segment, keeping its acceleration
    pub fn contracted(&self, dt: f32) -> Self {
        Self {
            initial: self.initial.integrated(self.acceleration, dt),
            acceleration: self.acceleration,
            duration: self.duration - dt,
        }
    }
}

/// Sum of segment durations
pub fn total_duration<T>(segments: &[KinematicSegment<T>]) -> f32 {
    segments.iter().map(|s| s.duration).sum()
}

/// Integrate under constant `acceleration` for `dt` (not drawn from a budget)
pub fn acceleration_curve<T: Kinematic>(
    dt: f32,
    acceleration: T,
    state: &mut KinematicState<T>,
) -> KinematicSegment<T> {
    let segment = KinematicSegment::new(*state, acceleration, dt);
    *state = segment.final_state();
    segment
}

/// Accelerate toward `target` at `magnitude` until it is reached or `t` runs out.
///
/// Consumed time is taken from `t`. When the target is reached the velocity
/// is set to it exactly.
pub fn accelerate_toward_target_velocity(
    t: &mut f32,
    target: f32,
    magnitude: f32,
    state: &mut KinematicState<f32>,
) -> KinematicSegment<f32> {
    let delta = target - state.velocity;
    let acceleration = crate::sign(delta) * magnitude.abs();
    let time_to_target = if acceleration == 0.0 {
        0.0
    } else {
        delta / acceleration
    };
    let dt = t.min(time_to_target).max(0.0);
    *t -= dt;

    let segment = acceleration_curve(dt, acceleration, state);
    if dt >= time_to_target && acceleration != 0.0 {
        state.velocity = target;
    }
    segment
}

/// Coast at the current velocity for the whole remaining `t`
pub fn linear_motion_curve<T: Kinematic>(
    t: &mut f32,
    state: &mut KinematicState<T>,
) -> KinematicSegment<T> {
    let dt = t.max(0.0);
    *t = 0.0;
    acceleration_curve(dt, T::ZERO, state)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Check ordering, continuity and duration of a segment chain
    pub(crate) fn assert_continuous<T: Kinematic>(
        segments: &[KinematicSegment<T>],
        distance: impl Fn(T, T) -> f32,
        expected_duration: f32,
    ) {
        for pair in segments.windows(2) {
            let end = pair[0].final_state();
            assert!(distance(end.position, pair[1].initial.position) < 1e-3);
            assert!(distance(end.velocity, pair[1].initial.velocity) < 1e-3);
        }
        assert!((total_duration(segments) - expected_duration).abs() < 1e-5);
    }

    #[test]
    fn test_segment_evaluation() {
        let seg = KinematicSegment::new(KinematicState::new(1.0_f32, 2.0), -4.0, 1.0);
        assert!((seg.position_at(0.5) - 1.5).abs() < 1e-6);
        assert!((seg.velocity_at(0.5) - 0.0).abs() < 1e-6);
        let end = seg.final_state();
        assert!((end.position - 1.0).abs() < 1e-6);
        assert!((end.velocity + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_contracted_keeps_acceleration() {
        let seg = KinematicSegment::new(KinematicState::new(Vec2::ZERO, Vec2::X), Vec2::NEG_Y, 2.0);
        let rest = seg.contracted(0.5);
        assert_eq!(rest.acceleration, seg.acceleration);
        assert!((rest.duration - 1.5).abs() < 1e-6);
        assert!((rest.initial.position - seg.position_at(0.5)).length() < 1e-6);
        assert!((rest.final_state().position - seg.final_state().position).length() < 1e-5);
    }

    #[test]
    fn test_accelerate_reaches_target_exactly() {
        let mut t = 1.0;
        let mut state = KinematicState::new(0.0_f32, 0.0);
        let seg = accelerate_toward_target_velocity(&mut t, 3.0, 7.0, &mut state);
        assert_eq!(state.velocity, 3.0);
        assert!((seg.duration - 3.0 / 7.0).abs() < 1e-6);
        assert!((t - (1.0 - 3.0 / 7.0)).abs() < 1e-6);
    }

    #[test]
    fn test_accelerate_runs_out_of_time() {
        let mut t = 0.1;
        let mut state = KinematicState::new(0.0_f32, 10.0);
        accelerate_toward_target_velocity(&mut t, 0.0, 20.0, &mut state);
        assert_eq!(t, 0.0);
        assert!((state.velocity - 8.0).abs() < 1e-5);
        assert!((state.position - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_accelerate_at_target_consumes_nothing() {
        let mut t = 0.5;
        let mut state = KinematicState::new(2.0_f32, 4.0);
        let seg = accelerate_toward_target_velocity(&mut t, 4.0, 10.0, &mut state);
        assert_eq!(seg.duration, 0.0);
        assert_eq!(t, 0.5);
        assert_eq!(state.position, 2.0);
    }

    #[test]
    fn test_linear_consumes_everything() {
        let mut t = 0.25;
        let mut state = KinematicState::new(Vec2::ZERO, Vec2::new(4.0, -8.0));
        let seg = linear_motion_curve(&mut t, &mut state);
        assert_eq!(t, 0.0);
        assert_eq!(seg.duration, 0.25);
        assert!((state.position - Vec2::new(1.0, -2.0)).length() < 1e-6);
    }

    #[test]
    fn test_axis_split_round_trip() {
        let state = KinematicState::new(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0));
        assert_eq!(KinematicState::from_axes(state.x(), state.y()), state);
    }

    proptest! {
        #[test]
        fn prop_accelerate_then_coast_is_continuous(
            v0 in -20.0f32..20.0,
            target in -20.0f32..20.0,
            accel in 0.1f32..100.0,
            budget in 0.0f32..0.5,
        ) {
            let mut t = budget;
            let mut state = KinematicState::new(0.0_f32, v0);
            let a = accelerate_toward_target_velocity(&mut t, target, accel, &mut state);
            let b = linear_motion_curve(&mut t, &mut state);
            prop_assert_eq!(t, 0.0);
            assert_continuous(&[a, b], |p, q| (p - q).abs(), budget);
            // Never overshoots the target
            let lo = v0.min(target) - 1e-4;
            let hi = v0.max(target) + 1e-4;
            prop_assert!(state.velocity >= lo && state.velocity <= hi);
        }
    }
}
