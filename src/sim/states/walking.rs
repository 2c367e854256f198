use glam::Vec2;

use super::curves::{self, integrate_axes};
use super::{
    Falling, Jumping, MovementState, StateKind, Transition, common_interrupts, try_wall_slide,
};
use crate::sim::interrupt::{Interrupt, InterruptQuery};
use crate::sim::kinematics::{KinematicSegment, KinematicState};
use crate::sim::params::MovementParameters;
use crate::sim::player::PlayerInfo;

/// On the ground, or just walked off a ledge and still inside coyote time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Walking {
    pub params: MovementParameters,
}

impl Walking {
    pub fn new(params: MovementParameters) -> Self {
        Self { params }
    }

    pub fn kind(&self) -> StateKind {
        StateKind::Walking
    }

    /// Grounded, or falling for less than the coyote window
    fn can_jump(&self, kin: &KinematicState<Vec2>, player: &dyn PlayerInfo) -> bool {
        player.ground_check()
            || -kin.velocity.y / self.params.fall_gravity() < self.params.coyote_time()
    }

    pub fn process_interrupts(
        self,
        kin: &mut KinematicState<Vec2>,
        interrupts: &[Interrupt],
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let params = self.params;

        if !self.can_jump(kin, player) {
            return Transition::Switch(Falling::new(params).into());
        }
        if let Some(slide) = try_wall_slide(params, interrupts, player) {
            return Transition::Switch(slide);
        }
        if interrupts.jump_started() {
            return Transition::Switch(Jumping::new(params, kin, player).into());
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
        let grounded = player.ground_check();

        integrate_axes(
            t,
            kin,
            motion,
            |t, x| curves::walking(&params, t, x, aim_x),
            |t, y| {
                if grounded {
                    curves::coast(t, y)
                } else {
                    curves::free_fall(&params, t, y)
                }
            },
        );
        Transition::Stay(MovementState::Walking(self))
    }
}
