use glam::Vec2;

use super::{Jumping, MovementState, StateKind, Transition, WallJump, Walking};
use crate::consts::MAX_TRANSITIONS_PER_UPDATE;
use crate::sim::interrupt::Interrupt;
use crate::sim::kinematics::{KinematicSegment, KinematicState};
use crate::sim::params::MovementParameters;
use crate::sim::player::PlayerInfo;
use crate::sign;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrappleJumpKind {
    /// Off the floor an impact was sliding along
    Ground { launch_direction: f32 },
    /// Off the wall an impact was sliding up
    Wall,
    /// Off the top of a vertical grapple
    Vertical,
}

/// A jump flown on a modified parameter set.
///
/// The wrapped jump (and the fall that follows it) runs on boosted
/// parameters. As soon as it hands off to anything else the decorator
/// steps aside and the next state gets the base parameters back.
#[derive(Debug, Clone, PartialEq)]
pub struct GrappleJump {
    /// Base parameters, restored on exit
    pub params: MovementParameters,
    pub variant: GrappleJumpKind,
    pub inner: Box<MovementState>,
}

impl GrappleJump {
    pub fn ground(
        params: MovementParameters,
        kin: &KinematicState<Vec2>,
        player: &mut dyn PlayerInfo,
    ) -> Self {
        let base = params.base();
        let launch_speed = kin.velocity.x;
        let jump = Jumping::new(base.grapple_jump(launch_speed), kin, player);
        Self {
            params: base,
            variant: GrappleJumpKind::Ground {
                launch_direction: sign(launch_speed),
            },
            inner: Box::new(jump.into()),
        }
    }

    pub fn wall(
        params: MovementParameters,
        kin: &KinematicState<Vec2>,
        player: &mut dyn PlayerInfo,
    ) -> Self {
        let base = params.base();
        let modified = base.grapple_wall_jump(kin.velocity.length());
        let direction = player.wall_check() as f32;
        let jump = WallJump::new(modified, direction, kin, player);
        Self {
            params: base,
            variant: GrappleJumpKind::Wall,
            inner: Box::new(jump.into()),
        }
    }

    pub fn vertical(
        params: MovementParameters,
        kin: &KinematicState<Vec2>,
        player: &mut dyn PlayerInfo,
    ) -> Self {
        let base = params.base();
        let jump = Jumping::new(base.vertical_grapple_jump(), kin, player);
        Self {
            params: base,
            variant: GrappleJumpKind::Vertical,
            inner: Box::new(jump.into()),
        }
    }

    pub fn kind(&self) -> StateKind {
        match self.variant {
            GrappleJumpKind::Ground { .. } => StateKind::GrappleJump,
            GrappleJumpKind::Wall => StateKind::GrappleWallJump,
            GrappleJumpKind::Vertical => StateKind::VerticalGrappleJump,
        }
    }

    pub fn with_params(self, params: MovementParameters) -> Self {
        Self { params, ..self }
    }

    /// Whether a hand-off inside the wrapped state is still part of this jump.
    /// A fresh wall jump is not: it starts over on base parameters.
    fn keeps(&self, next: &MovementState) -> bool {
        match self.variant {
            GrappleJumpKind::Ground { .. } | GrappleJumpKind::Vertical => {
                matches!(next, MovementState::Jumping(_) | MovementState::Falling(_))
            }
            GrappleJumpKind::Wall => matches!(next, MovementState::Falling(_)),
        }
    }

    /// Fold the wrapped state's transition back in, or leave with base parameters
    fn settle(mut self, transition: Transition) -> Result<Self, MovementState> {
        match transition {
            Transition::Stay(inner) => {
                self.inner = Box::new(inner);
                Ok(self)
            }
            Transition::Switch(next) if self.keeps(&next) => {
                self.inner = Box::new(next);
                Ok(self)
            }
            Transition::Switch(next) => {
                log::debug!("{:?} ends in {:?}", self.kind(), next.kind());
                Err(next.with_params(self.params))
            }
        }
    }

    fn take_inner(&mut self) -> MovementState {
        std::mem::replace(self.inner.as_mut(), Walking::new(self.params).into())
    }

    /// Let a ground launch keep its speed while still moving the launch way.
    ///
    /// Speed is measured against the horizontal share of the aim, so a
    /// diagonal hold keeps the launch speed too.
    fn boost(&mut self, kin: &KinematicState<Vec2>, player: &dyn PlayerInfo) {
        let GrappleJumpKind::Ground { launch_direction } = self.variant else {
            return;
        };
        let aim_x = player.aim().x.abs();
        let vx = kin.velocity.x;
        let scaled = if aim_x != 0.0 { vx / aim_x } else { vx };
        let base_top = self.params.top_speed();
        let top_speed = if scaled.abs() > base_top && scaled * launch_direction > 0.0 {
            scaled.abs()
        } else {
            base_top
        };

        let inner = self.take_inner();
        let mut params = inner.params();
        params.overrides.top_speed = Some(top_speed);
        *self.inner = inner.with_params(params);
    }

    pub fn process_interrupts(
        mut self,
        kin: &mut KinematicState<Vec2>,
        interrupts: &[Interrupt],
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let transition = self
            .take_inner()
            .process_interrupts(kin, interrupts, player);
        match self.settle(transition) {
            Ok(kept) => Transition::Stay(kept.into()),
            Err(next) => Transition::Switch(next),
        }
    }

    pub fn update_kinematics(
        mut self,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        motion: &mut Vec<KinematicSegment<Vec2>>,
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let mut handoffs = 0;
        loop {
            self.boost(kin, player);
            let transition = self.take_inner().update_kinematics(t, kin, motion, player);
            let switched = transition.is_switch();

            self = match self.settle(transition) {
                Ok(kept) => kept,
                Err(next) => return Transition::Switch(next),
            };
            if !switched || *t <= 0.0 {
                return Transition::Stay(self.into());
            }

            handoffs += 1;
            if handoffs >= MAX_TRANSITIONS_PER_UPDATE {
                log::warn!("Dropping {t}s after {handoffs} hand-offs inside {:?}", self.kind());
                *t = 0.0;
                return Transition::Stay(self.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::player::testing::MockPlayer;
    use crate::sim::states::tests::{kin, landing};

    #[test]
    fn test_ground_launch_keeps_speed_while_held() {
        let params = MovementParameters::default();
        let mut player = MockPlayer {
            aim: Vec2::X,
            grounded: true,
            ..Default::default()
        };
        let mut k = kin((0.0, 0.0), (18.0, 0.0));
        let state: MovementState = GrappleJump::ground(params, &k, &mut player).into();
        assert_eq!(state.kind(), StateKind::GrappleJump);
        assert!(!state.params().is_modified());

        player.grounded = false;
        let mut t = SIM_DT;
        let mut motion = Vec::new();
        let state = state.fully_update_kinematics(&mut t, &mut k, &mut motion, &mut player);
        assert_eq!(state.kind(), StateKind::GrappleJump);
        assert!((k.velocity.x - 18.0).abs() < 1e-4);
        assert!(k.velocity.y > 0.0);
    }

    #[test]
    fn test_ground_launch_keeps_speed_on_diagonal_aim() {
        let params = MovementParameters::default();
        let mut player = MockPlayer {
            aim: Vec2::new(0.5, 0.5),
            ..Default::default()
        };
        let mut k = kin((0.0, 0.0), (18.0, 0.0));
        let state: MovementState = GrappleJump::ground(params, &k, &mut player).into();

        let mut t = SIM_DT;
        let mut motion = Vec::new();
        let state = state.fully_update_kinematics(&mut t, &mut k, &mut motion, &mut player);
        assert_eq!(state.kind(), StateKind::GrappleJump);
        assert!((k.velocity.x - 18.0).abs() < 1e-3, "vx {}", k.velocity.x);
    }

    #[test]
    fn test_ground_launch_brakes_after_turning_back() {
        let params = MovementParameters::default();
        let mut player = MockPlayer {
            aim: Vec2::NEG_X,
            ..Default::default()
        };
        // Already moving against the launch direction
        let mut k = kin((0.0, 0.0), (18.0, 0.0));
        let state: MovementState = GrappleJump::ground(params, &k, &mut player).into();
        k.velocity.x = -12.0;

        let mut t = SIM_DT;
        let mut motion = Vec::new();
        state.fully_update_kinematics(&mut t, &mut k, &mut motion, &mut player);
        assert!(k.velocity.x > -12.0);
    }

    #[test]
    fn test_ground_launch_brakes_when_released() {
        let params = MovementParameters::default();
        let mut player = MockPlayer::default();
        let mut k = kin((0.0, 0.0), (18.0, 0.0));
        let state: MovementState = GrappleJump::ground(params, &k, &mut player).into();

        let mut t = SIM_DT;
        let mut motion = Vec::new();
        state.fully_update_kinematics(&mut t, &mut k, &mut motion, &mut player);
        assert!(k.velocity.x < 18.0);
    }

    #[test]
    fn test_landing_restores_base_params() {
        let params = MovementParameters::default();
        let mut player = MockPlayer::default();
        let mut k = kin((0.0, 0.0), (18.0, 0.0));
        let state: MovementState = GrappleJump::ground(params, &k, &mut player).into();

        let MovementState::GrappleJump(jump) = &state else {
            panic!("expected grapple jump");
        };
        assert!(jump.inner.params().is_modified());

        k.velocity.y = -3.0;
        let next = state.process_interrupts(&mut k, &[landing()], &mut player);
        assert!(next.is_switch());
        let next = next.into_state();
        assert_eq!(next.kind(), StateKind::Walking);
        assert!(!next.params().is_modified());
    }

    #[test]
    fn test_apex_stays_wrapped() {
        let params = MovementParameters::default();
        let mut player = MockPlayer::default();
        let mut k = kin((0.0, 0.0), (0.0, 0.0));
        let mut state: MovementState = GrappleJump::vertical(params, &k, &mut player).into();
        let mut motion = Vec::new();
        let mut peak = 0.0_f32;
        for _ in 0..60 {
            let mut t = SIM_DT;
            state = state.fully_update_kinematics(&mut t, &mut k, &mut motion, &mut player);
            peak = peak.max(k.position.y);
        }
        assert_eq!(state.kind(), StateKind::VerticalGrappleJump);
        assert!((peak - params.max_vertical_grapple_jump_height).abs() < 5e-2, "peak {peak}");
    }

    #[test]
    fn test_new_wall_jump_leaves_on_base_params() {
        let params = MovementParameters::default();
        let mut player = MockPlayer {
            wall: 1,
            ..Default::default()
        };
        let mut k = kin((0.0, 0.0), (0.0, params.impact_speed));
        let state: MovementState = GrappleJump::wall(params, &k, &mut player).into();
        assert_eq!(state.kind(), StateKind::GrappleWallJump);

        let next = state.process_interrupts(&mut k, &[Interrupt::JumpStarted], &mut player);
        assert!(next.is_switch());
        let MovementState::WallJump(jump) = next.into_state() else {
            panic!("expected wall jump");
        };
        assert!(!jump.params.is_modified());
        assert_eq!(jump.direction, 1.0);
    }
}
