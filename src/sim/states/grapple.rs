use glam::Vec2;

use super::curves::Segments;
use super::{
    Falling, GrappleJump, Jumping, MovementState, StateKind, Transition, WallJump,
    common_interrupts,
};
use crate::sim::interrupt::{Interrupt, InterruptQuery};
use crate::sim::kinematics::{
    KinematicSegment, KinematicState, accelerate_toward_target_velocity, acceleration_curve,
    linear_motion_curve,
};
use crate::sim::merge::merge_segments;
use crate::sim::params::MovementParameters;
use crate::sim::player::PlayerInfo;
use crate::sign;

/// Below this the actor counts as having reached the anchor
const ARRIVAL_DISTANCE: f32 = 1e-4;

/// Reeling in toward an anchor at constant speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grapple {
    pub params: MovementParameters,
    pub anchor: Vec2,
    /// Straight up, re-aimed at the actor's column on the first update
    pub vertical: bool,
    retarget: bool,
}

impl Grapple {
    pub fn new(params: MovementParameters, anchor: Vec2) -> Self {
        Self {
            params,
            anchor,
            vertical: false,
            retarget: false,
        }
    }

    pub fn vertical(params: MovementParameters, anchor: Vec2) -> Self {
        Self {
            vertical: true,
            retarget: true,
            ..Self::new(params, anchor)
        }
    }

    pub fn kind(&self) -> StateKind {
        if self.vertical {
            StateKind::VerticalGrapple
        } else {
            StateKind::Grapple
        }
    }

    pub fn process_interrupts(
        self,
        kin: &mut KinematicState<Vec2>,
        interrupts: &[Interrupt],
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let params = self.params;

        if interrupts.has(Interrupt::AnchorToggled) {
            return Transition::Switch(Falling::new(params).into());
        }
        if self.vertical && interrupts.jump_started() {
            return Transition::Switch(GrappleJump::vertical(params, kin, player).into());
        }

        if let Some(collision) = interrupts.collision().filter(|c| !c.is_ceiling()) {
            if player.flush_jump_buffer() {
                let jump: MovementState = if player.ground_check() {
                    Jumping::new(params, kin, player).into()
                } else {
                    let direction = match player.wall_check() {
                        0 => sign(collision.normal.x),
                        wall => wall as f32,
                    };
                    WallJump::new(params, direction, kin, player).into()
                };
                return Transition::Switch(jump);
            }

            let heading = (self.anchor - kin.position).normalize_or_zero();
            let normal = collision.normal;
            let slide = (heading - heading.dot(normal) * normal).normalize_or_zero();
            return Transition::Switch(Impact::new(params, slide).into());
        }

        common_interrupts(self.into(), kin, interrupts, player).or_else(|state| {
            if interrupts.collision().is_some() {
                Transition::Switch(Falling::new(params).into())
            } else {
                Transition::Stay(state)
            }
        })
    }

    pub fn update_kinematics(
        mut self,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        motion: &mut Vec<KinematicSegment<Vec2>>,
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        if self.retarget {
            self.retarget = false;
            self.anchor = Vec2::new(kin.position.x, self.anchor.y);
        }

        let to_anchor = self.anchor - kin.position;
        let distance = to_anchor.length();
        if distance <= ARRIVAL_DISTANCE {
            return Transition::Switch(Falling::new(self.params).into());
        }

        let speed = self.params.grapple_speed;
        kin.velocity = to_anchor / distance * speed;
        let travel = t.min(distance / speed);
        *t -= travel;
        motion.push(acceleration_curve(travel, Vec2::ZERO, kin));

        player.draw_rope(self.anchor, kin.position);
        player.show_rope(true);

        if *t > 0.0 {
            Transition::Switch(Falling::new(self.params).into())
        } else {
            Transition::Stay(MovementState::Grapple(self))
        }
    }
}

/// Slide along a surface after slamming into it mid-grapple, bleeding
/// impact speed down to top speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub params: MovementParameters,
    /// Unit slide direction (zero for a head-on hit)
    pub direction: Vec2,
    launched: bool,
}

impl Impact {
    pub fn new(params: MovementParameters, direction: Vec2) -> Self {
        Self {
            params,
            direction,
            launched: false,
        }
    }

    pub fn kind(&self) -> StateKind {
        StateKind::Impact
    }

    /// Grapple-boosted jump off the floor or wall being slid along
    fn jump(
        &self,
        kin: &KinematicState<Vec2>,
        player: &mut dyn PlayerInfo,
    ) -> MovementState {
        if player.ground_check() {
            GrappleJump::ground(self.params, kin, player).into()
        } else {
            GrappleJump::wall(self.params, kin, player).into()
        }
    }

    pub fn process_interrupts(
        self,
        kin: &mut KinematicState<Vec2>,
        interrupts: &[Interrupt],
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        if interrupts.jump_started() {
            return Transition::Switch(self.jump(kin, player));
        }
        common_interrupts(self.into(), kin, interrupts, player)
    }

    pub fn update_kinematics(
        mut self,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        motion: &mut Vec<KinematicSegment<Vec2>>,
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let params = self.params;
        if !self.launched {
            self.launched = true;
            kin.velocity = params.impact_speed * self.direction;
        }
        if player.flush_jump_buffer() {
            return Transition::Switch(self.jump(kin, player));
        }

        let target = params.top_speed() * self.direction;
        let magnitude = (params.impact_acceleration() * self.direction).abs();

        let budget = *t;
        let (mut x, mut y) = (kin.x(), kin.y());
        let (mut tx, mut ty) = (budget, budget);
        let mut xs: Segments = vec![accelerate_toward_target_velocity(
            &mut tx,
            target.x,
            magnitude.x,
            &mut x,
        )];
        let mut ys: Segments = vec![accelerate_toward_target_velocity(
            &mut ty,
            target.y,
            magnitude.y,
            &mut y,
        )];

        // The slower axis sets the impact length; the other coasts to match
        let elapsed = (budget - tx).max(budget - ty);
        let mut pad_x = elapsed - (budget - tx);
        let mut pad_y = elapsed - (budget - ty);
        xs.push(linear_motion_curve(&mut pad_x, &mut x));
        ys.push(linear_motion_curve(&mut pad_y, &mut y));

        motion.extend(merge_segments(&xs, &ys));
        *kin = KinematicState::from_axes(x, y);
        *t -= elapsed;

        if *t > 0.0 {
            kin.velocity = Vec2::ZERO;
            Transition::Switch(Falling::new(params).into())
        } else {
            Transition::Stay(MovementState::Impact(self))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::interrupt::Collision;
    use crate::sim::player::testing::MockPlayer;
    use crate::sim::states::tests::{kin, landing};

    fn grapple() -> Grapple {
        Grapple::new(MovementParameters::default(), Vec2::new(4.0, 3.0))
    }

    #[test]
    fn test_grapple_reels_toward_anchor() {
        let mut player = MockPlayer::default();
        let mut k = kin((0.0, 0.0), (0.0, 0.0));
        let mut motion = Vec::new();
        let mut t = 0.1;
        let next = grapple().update_kinematics(&mut t, &mut k, &mut motion, &mut player);

        assert!(!next.is_switch());
        assert_eq!(t, 0.0);
        // Speed 10 along (0.8, 0.6)
        assert!((k.position - Vec2::new(0.8, 0.6)).length() < 1e-5);
        assert!((k.velocity - Vec2::new(8.0, 6.0)).length() < 1e-4);
        assert!(player.rope_visible);
    }

    #[test]
    fn test_grapple_arrival_hands_leftover_to_falling() {
        let mut player = MockPlayer::default();
        let mut k = kin((0.0, 0.0), (0.0, 0.0));
        let mut motion = Vec::new();
        let mut t = 1.0;
        let next = grapple().update_kinematics(&mut t, &mut k, &mut motion, &mut player);

        assert!(next.is_switch());
        assert_eq!(next.into_state().kind(), StateKind::Falling);
        assert!((t - 0.5).abs() < 1e-5);
        assert!((k.position - Vec2::new(4.0, 3.0)).length() < 1e-4);
    }

    #[test]
    fn test_vertical_grapple_retargets_column() {
        let mut player = MockPlayer::default();
        let state = Grapple::vertical(MovementParameters::default(), Vec2::new(3.0, 5.0));
        assert_eq!(state.kind(), StateKind::VerticalGrapple);

        let mut k = kin((1.0, 0.0), (0.0, 0.0));
        let mut motion = Vec::new();
        let mut t = 0.1;
        let MovementState::Grapple(next) = state
            .update_kinematics(&mut t, &mut k, &mut motion, &mut player)
            .into_state()
        else {
            panic!("expected grapple");
        };
        assert_eq!(next.anchor, Vec2::new(1.0, 5.0));
        assert_eq!(k.velocity, Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_side_hit_becomes_impact() {
        let mut player = MockPlayer::default();
        let mut k = kin((0.0, 0.0), (8.0, 6.0));
        let wall = Interrupt::Collision(Collision::from_deflection(Vec2::new(-0.1, 0.0)));
        let MovementState::Impact(impact) = grapple()
            .process_interrupts(&mut k, &[wall], &mut player)
            .into_state()
        else {
            panic!("expected impact");
        };
        assert!((impact.direction - Vec2::Y).length() < 1e-6);
    }

    #[test]
    fn test_buffered_jump_on_grapple_landing() {
        let mut player = MockPlayer {
            grounded: true,
            jump_buffered: true,
            ..Default::default()
        };
        let mut k = kin((0.0, 0.0), (8.0, -6.0));
        let next = Grapple::new(MovementParameters::default(), Vec2::new(4.0, -3.0))
            .process_interrupts(&mut k, &[landing()], &mut player);
        assert_eq!(next.into_state().kind(), StateKind::Jumping);
    }

    #[test]
    fn test_ceiling_hit_drops() {
        let mut player = MockPlayer::default();
        let mut k = kin((0.0, 0.0), (0.0, 10.0));
        let ceiling = Interrupt::Collision(Collision::from_deflection(Vec2::new(0.0, -0.1)));
        let next = Grapple::new(MovementParameters::default(), Vec2::new(0.0, 3.0))
            .process_interrupts(&mut k, &[ceiling], &mut player);
        assert_eq!(next.into_state().kind(), StateKind::Falling);
        assert_eq!(k.velocity.y, 0.0);
    }

    #[test]
    fn test_release_drops() {
        let mut player = MockPlayer::default();
        let mut k = kin((0.0, 0.0), (8.0, 6.0));
        let next = grapple().process_interrupts(&mut k, &[Interrupt::AnchorToggled], &mut player);
        assert_eq!(next.into_state().kind(), StateKind::Falling);
    }

    #[test]
    fn test_impact_decays_to_top_speed_then_falls() {
        let params = MovementParameters::default();
        let mut player = MockPlayer::default();
        let mut k = kin((0.0, 0.0), (0.0, 0.0));
        let mut motion = Vec::new();

        let mut t = 0.5 * params.impact_duration();
        let state = Impact::new(params, Vec2::Y)
            .update_kinematics(&mut t, &mut k, &mut motion, &mut player)
            .into_state();
        assert_eq!(state.kind(), StateKind::Impact);
        assert!(k.velocity.y < params.impact_speed && k.velocity.y > params.top_speed());

        let mut t = params.impact_duration();
        let next = state.update_kinematics(&mut t, &mut k, &mut motion, &mut player);
        assert!(next.is_switch());
        assert_eq!(next.into_state().kind(), StateKind::Falling);
        assert!((t - 0.5 * params.impact_duration()).abs() < 1e-5);
        assert_eq!(k.velocity, Vec2::ZERO);
        // Covered the impact distance
        assert!((k.position.y - params.impact_distance).abs() < 1e-4);
    }

    #[test]
    fn test_impact_jump_off_floor() {
        let mut player = MockPlayer {
            grounded: true,
            ..Default::default()
        };
        let mut k = kin((0.0, 0.0), (15.0, 0.0));
        let next = Impact::new(MovementParameters::default(), Vec2::X).process_interrupts(
            &mut k,
            &[Interrupt::JumpStarted],
            &mut player,
        );
        assert_eq!(next.into_state().kind(), StateKind::GrappleJump);
    }
}
