//! Composite per-axis motion curves shared by the states
//!
//! Each curve consumes the whole budget `t` it is given and returns an
//! ordered, continuous list of segments.

use glam::Vec2;

use crate::sim::kinematics::{
    KinematicSegment, KinematicState, accelerate_toward_target_velocity, linear_motion_curve,
};
use crate::sim::merge::merge_segments;
use crate::sim::params::MovementParameters;

pub type Segments = Vec<KinematicSegment<f32>>;

/// Brake toward zero (or the new target if it is slower in the same
/// direction), accelerate toward `top_speed · aim_x`, then coast
pub fn walking(
    params: &MovementParameters,
    t: &mut f32,
    state: &mut KinematicState<f32>,
    aim_x: f32,
) -> Segments {
    let target = params.top_speed() * aim_x;
    let brake_target = if state.velocity * target < 0.0 { 0.0 } else { target };

    let mut segments = Vec::with_capacity(3);
    if brake_target.abs() < state.velocity.abs() {
        segments.push(accelerate_toward_target_velocity(
            t,
            brake_target,
            params.deceleration(),
            state,
        ));
    }
    segments.push(accelerate_toward_target_velocity(
        t,
        target,
        params.acceleration(),
        state,
    ));
    segments.push(linear_motion_curve(t, state));
    segments
}

/// Clamp to `target` if already past it, accelerate toward it under `gravity`, then coast
pub fn falling(
    t: &mut f32,
    state: &mut KinematicState<f32>,
    target: f32,
    gravity: f32,
) -> Segments {
    state.velocity = state.velocity.max(target);
    vec![
        accelerate_toward_target_velocity(t, target, gravity, state),
        linear_motion_curve(t, state),
    ]
}

/// Fall toward terminal velocity under fall gravity
pub fn free_fall(
    params: &MovementParameters,
    t: &mut f32,
    state: &mut KinematicState<f32>,
) -> Segments {
    falling(t, state, -params.terminal_velocity(), params.fall_gravity())
}

/// Rise under `gravity` until the apex, then free fall
pub fn jump(
    params: &MovementParameters,
    t: &mut f32,
    state: &mut KinematicState<f32>,
    gravity: f32,
) -> Segments {
    let mut segments = Vec::with_capacity(3);
    if state.velocity > 0.0 {
        segments.push(accelerate_toward_target_velocity(t, 0.0, gravity, state));
    }
    segments.extend(free_fall(params, t, state));
    segments
}

/// Coast for `t` (or nothing when `t` is zero)
pub fn coast(t: &mut f32, state: &mut KinematicState<f32>) -> Segments {
    vec![linear_motion_curve(t, state)]
}

/// Run independent curves on each axis and merge them into planar motion.
///
/// Both curves see the same budget; whatever the slower axis left over is
/// written back to `t`.
pub fn integrate_axes(
    t: &mut f32,
    kin: &mut KinematicState<Vec2>,
    motion: &mut Vec<KinematicSegment<Vec2>>,
    x_curve: impl FnOnce(&mut f32, &mut KinematicState<f32>) -> Segments,
    y_curve: impl FnOnce(&mut f32, &mut KinematicState<f32>) -> Segments,
) {
    let (mut x, mut y) = (kin.x(), kin.y());
    let (mut tx, mut ty) = (*t, *t);
    let xs = x_curve(&mut tx, &mut x);
    let ys = y_curve(&mut ty, &mut y);
    motion.extend(merge_segments(&xs, &ys));
    *kin = KinematicState::from_axes(x, y);
    *t = tx.max(ty);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::kinematics::tests::assert_continuous;
    use proptest::prelude::*;

    #[test]
    fn test_falling_scenario() {
        // (0, -5) for 0.1s under gravity 20
        let mut t = 0.1;
        let mut state = KinematicState::new(0.0_f32, -5.0);
        let segments = falling(&mut t, &mut state, -32.0, 20.0);

        assert_eq!(segments.len(), 2);
        assert!((segments[0].acceleration + 20.0).abs() < 1e-6);
        assert_eq!(segments[1].acceleration, 0.0);
        assert!((state.velocity + 7.0).abs() < 1e-5);
        assert_continuous(&segments, |p, q| (p - q).abs(), 0.1);
    }

    #[test]
    fn test_falling_clamps_to_terminal() {
        let mut t = 0.5;
        let mut state = KinematicState::new(0.0_f32, -5.0);
        falling(&mut t, &mut state, -7.0, 20.0);
        assert_eq!(state.velocity, -7.0);

        let mut t = 0.1;
        let mut state = KinematicState::new(0.0_f32, -50.0);
        falling(&mut t, &mut state, -7.0, 20.0);
        assert_eq!(state.velocity, -7.0);
    }

    #[test]
    fn test_walking_reverses_through_zero() {
        let params = MovementParameters::default();
        let mut t = 1.0;
        let mut state = KinematicState::new(0.0_f32, 10.0);
        let segments = walking(&params, &mut t, &mut state, -1.0);

        assert_eq!(segments.len(), 3);
        assert!(segments[0].acceleration < 0.0);
        assert!((segments[0].final_state().velocity).abs() < 1e-5);
        assert_eq!(state.velocity, -params.top_speed());
        assert_continuous(&segments, |p, q| (p - q).abs(), 1.0);
    }

    #[test]
    fn test_walking_releases_to_stop() {
        let params = MovementParameters::default();
        let mut t = 1.0;
        let mut state = KinematicState::new(0.0_f32, 10.0);
        walking(&params, &mut t, &mut state, 0.0);
        assert_eq!(state.velocity, 0.0);
        // Decelerating from top speed covers the deceleration distance
        assert!((state.position - params.deceleration_distance).abs() < 1e-4);
    }

    #[test]
    fn test_jump_reaches_apex_height() {
        let params = MovementParameters::default();
        let mut t = params.rise_time();
        let mut state = KinematicState::new(0.0_f32, params.jump_velocity());
        jump(&params, &mut t, &mut state, params.rise_gravity());
        assert!((state.position - params.max_jump_height).abs() < 1e-3);
        assert!(state.velocity.abs() < 1e-3);
    }

    #[test]
    fn test_integrate_axes_merges() {
        let params = MovementParameters::default();
        let mut t = 0.2;
        let mut kin = KinematicState::new(Vec2::ZERO, Vec2::new(0.0, -1.0));
        let mut motion = Vec::new();
        integrate_axes(
            &mut t,
            &mut kin,
            &mut motion,
            |t, s| walking(&params, t, s, 1.0),
            |t, s| free_fall(&params, t, s),
        );
        assert_eq!(t, 0.0);
        assert_continuous(&motion, |p, q| p.distance(q), 0.2);
        let end = motion.last().map(|s| s.final_state()).expect("motion");
        assert!((end.position - kin.position).length() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_curves_are_continuous(
            v in -30.0f32..30.0,
            aim in -1.0f32..1.0,
            budget in 0.0f32..0.25,
        ) {
            let params = MovementParameters::default();
            let mut t = budget;
            let mut state = KinematicState::new(0.0_f32, v);
            let walk = walking(&params, &mut t, &mut state, aim);
            prop_assert_eq!(t, 0.0);
            assert_continuous(&walk, |p, q| (p - q).abs(), budget);

            let mut t = budget;
            let mut state = KinematicState::new(0.0_f32, v);
            let rise = jump(&params, &mut t, &mut state, params.rise_gravity());
            prop_assert_eq!(t, 0.0);
            // Falling clamps the starting velocity, so only check the chain after it
            for pair in rise.windows(2) {
                let end = pair[0].final_state();
                prop_assert!((end.position - pair[1].initial.position).abs() < 1e-3);
            }
            prop_assert!((crate::sim::kinematics::total_duration(&rise) - budget).abs() < 1e-5);
        }
    }
}
