use glam::Vec2;

use super::curves::{self, integrate_axes};
use super::{
    Jumping, MovementState, StateKind, Transition, WallJump, common_interrupts, try_wall_jump,
    try_wall_slide,
};
use crate::sim::interrupt::{Interrupt, InterruptQuery};
use crate::sim::kinematics::{KinematicSegment, KinematicState};
use crate::sim::params::MovementParameters;
use crate::sim::player::PlayerInfo;

/// Airborne and descending (or drifting) under gravity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Falling {
    pub params: MovementParameters,
    pub gravity: f32,
}

impl Falling {
    pub fn new(params: MovementParameters) -> Self {
        Self::with_gravity(params, params.fall_gravity())
    }

    pub fn with_gravity(params: MovementParameters, gravity: f32) -> Self {
        Self { params, gravity }
    }

    pub fn kind(&self) -> StateKind {
        StateKind::Falling
    }

    pub fn process_interrupts(
        self,
        kin: &mut KinematicState<Vec2>,
        interrupts: &[Interrupt],
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let params = self.params;

        if interrupts.jump_started() && player.ground_check() {
            return Transition::Switch(Jumping::new(params, kin, player).into());
        }

        common_interrupts(self.into(), kin, interrupts, player).or_else(|state| {
            try_wall_jump(params, kin, interrupts, player)
                .or_else(|| try_wall_slide(params, interrupts, player))
                .map_or(Transition::Stay(state), Transition::Switch)
        })
    }

    pub fn update_kinematics(
        self,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        motion: &mut Vec<KinematicSegment<Vec2>>,
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let params = self.params;
        let aim_x = player.aim().x;
        let target = -params.terminal_velocity();

        integrate_axes(
            t,
            kin,
            motion,
            |t, x| curves::walking(&params, t, x, aim_x),
            |t, y| curves::falling(t, y, target, self.gravity),
        );
        Transition::Stay(MovementState::Falling(self))
    }
}

/// Pressed against a wall while airborne, sliding down at a capped speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallSlide {
    pub params: MovementParameters,
}

impl WallSlide {
    pub fn new(params: MovementParameters) -> Self {
        Self { params }
    }

    pub fn kind(&self) -> StateKind {
        StateKind::WallSlide
    }

    pub fn process_interrupts(
        self,
        kin: &mut KinematicState<Vec2>,
        interrupts: &[Interrupt],
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let wall = player.wall_check();
        if interrupts.jump_started() && wall != 0 {
            let jump = WallJump::new(self.params, wall as f32, kin, player);
            return Transition::Switch(jump.into());
        }
        common_interrupts(self.into(), kin, interrupts, player)
    }

    pub fn update_kinematics(
        self,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        motion: &mut Vec<KinematicSegment<Vec2>>,
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let params = self.params;
        let aim_x = player.aim().x;

        // Let go, or the wall ran out
        if aim_x * player.wall_check() as f32 >= 0.0 {
            return Transition::Switch(Falling::new(params).into());
        }

        let target = -params.wall_slide_velocity();
        integrate_axes(
            t,
            kin,
            motion,
            |t, x| curves::walking(&params, t, x, aim_x),
            |t, y| curves::falling(t, y, target, params.fall_gravity()),
        );
        Transition::Stay(MovementState::WallSlide(self))
    }
}
