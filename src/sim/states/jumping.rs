use glam::Vec2;

use super::curves::{self, Segments, integrate_axes};
use super::{
    Falling, MovementState, StateKind, Transition, common_interrupts, try_wall_jump,
    try_wall_slide,
};
use crate::sim::interrupt::{Interrupt, InterruptQuery};
use crate::sim::kinematics::{KinematicSegment, KinematicState};
use crate::sim::params::MovementParameters;
use crate::sim::player::PlayerInfo;

/// Vertical half of a jump: launch, rise under (possibly cancelled) gravity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rise {
    pub gravity: f32,
    pub start_height: f32,
    /// Launch velocity, applied on the first update
    launch: Option<f32>,
    pub cancelled: bool,
}

impl Rise {
    fn new(params: &MovementParameters, start_height: f32) -> Self {
        Self {
            gravity: params.rise_gravity(),
            start_height,
            launch: Some(params.jump_velocity()),
            cancelled: false,
        }
    }

    fn is_launched(&self) -> bool {
        self.launch.is_none()
    }

    /// Switch to the gravity that stops the rise within the cancelled height
    fn cancel(&mut self, params: &MovementParameters, kin: &KinematicState<Vec2>) {
        self.cancelled = true;
        let velocity = self.launch.unwrap_or(kin.velocity.y);
        if velocity <= 0.0 {
            return;
        }

        let risen = kin.position.y - self.start_height;
        let max_rise = params
            .cancelled_jump_rise
            .max(params.min_jump_height - risen);
        let remaining = max_rise.min(params.max_jump_height() - risen);

        self.gravity = if remaining > f32::EPSILON {
            0.5 * velocity * velocity / remaining
        } else {
            params.fall_gravity()
        };
        log::trace!("Jump cancelled after rising {risen}, gravity now {}", self.gravity);
    }

    /// Integrate the jump for all of `t`; true once the apex is behind us
    fn ascend(
        &mut self,
        params: &MovementParameters,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        motion: &mut Vec<KinematicSegment<Vec2>>,
        x_curve: impl FnOnce(&mut f32, &mut KinematicState<f32>) -> Segments,
    ) -> bool {
        if let Some(velocity) = self.launch.take() {
            kin.velocity.y = velocity;
        }
        let gravity = self.gravity;
        integrate_axes(t, kin, motion, x_curve, |t, y| {
            curves::jump(params, t, y, gravity)
        });
        kin.velocity.y <= 0.0
    }
}

/// Interrupt handling shared by both jumps, after any cancel is applied
fn jump_interrupts(
    state: MovementState,
    kin: &mut KinematicState<Vec2>,
    interrupts: &[Interrupt],
    player: &mut dyn PlayerInfo,
) -> Transition {
    let params = state.params();
    if let Some(wall_jump) = try_wall_jump(params, kin, interrupts, player) {
        return Transition::Switch(wall_jump);
    }
    common_interrupts(state, kin, interrupts, player).or_else(|state| {
        try_wall_slide(params, interrupts, player)
            .map_or(Transition::Stay(state), Transition::Switch)
    })
}

/// Ground jump (also coyote and buffered jumps)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jumping {
    pub params: MovementParameters,
    pub rise: Rise,
}

impl Jumping {
    /// Starts from the current height; consumes any buffered press
    pub fn new(
        params: MovementParameters,
        kin: &KinematicState<Vec2>,
        player: &mut dyn PlayerInfo,
    ) -> Self {
        player.flush_jump_buffer();
        Self {
            params,
            rise: Rise::new(&params, kin.position.y),
        }
    }

    pub fn kind(&self) -> StateKind {
        if self.rise.cancelled {
            StateKind::CancelledJump
        } else {
            StateKind::Jumping
        }
    }

    pub fn process_interrupts(
        mut self,
        kin: &mut KinematicState<Vec2>,
        interrupts: &[Interrupt],
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        if interrupts.has(Interrupt::JumpCancelled) && !self.rise.cancelled {
            self.rise.cancel(&self.params, kin);
        }
        jump_interrupts(self.into(), kin, interrupts, player)
    }

    pub fn update_kinematics(
        mut self,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        motion: &mut Vec<KinematicSegment<Vec2>>,
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let params = self.params;
        let aim_x = player.aim().x;

        let apex = self.rise.ascend(&params, t, kin, motion, |t, x| {
            curves::walking(&params, t, x, aim_x)
        });
        if apex {
            Transition::Switch(Falling::new(params).into())
        } else {
            Transition::Stay(MovementState::Jumping(self))
        }
    }
}

/// Jump away from a wall; horizontal input is ignored for a short window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallJump {
    pub params: MovementParameters,
    pub rise: Rise,
    /// +1 jumps toward +x
    pub direction: f32,
    pub control_time: f32,
    pub elapsed: f32,
    launch_x: Option<f32>,
}

impl WallJump {
    pub fn new(
        params: MovementParameters,
        direction: f32,
        kin: &KinematicState<Vec2>,
        player: &mut dyn PlayerInfo,
    ) -> Self {
        player.flush_jump_buffer();
        Self {
            params,
            rise: Rise::new(&params, kin.position.y),
            direction,
            control_time: Self::control_time(&params),
            elapsed: 0.0,
            launch_x: Some(direction * params.top_speed()),
        }
    }

    pub fn kind(&self) -> StateKind {
        StateKind::WallJump
    }

    /// Re-derive everything parameter dependent. A jump that already
    /// launched keeps its velocities.
    pub fn with_params(self, params: MovementParameters) -> Self {
        let mut jump = Self {
            params,
            control_time: Self::control_time(&params),
            ..self
        };
        if !self.rise.is_launched() {
            jump.rise = Rise::new(&params, self.rise.start_height);
        }
        if jump.launch_x.is_some() {
            jump.launch_x = Some(self.direction * params.top_speed());
        }
        jump
    }

    /// How long horizontal input stays locked out after leaving the wall
    pub fn control_time(params: &MovementParameters) -> f32 {
        let top = params.top_speed();
        let accel_distance = 0.5 * top * top / params.acceleration();
        let decel_distance = 0.5 * top * top / params.deceleration();
        let base = 0.5
            * (params.rise_distance() + params.fall_distance()
                - 3.0 * decel_distance
                - accel_distance)
            / top;

        let climb = params.climb_height;
        let control = if climb < 0.0 {
            base - 0.5 * climb / params.terminal_velocity()
        } else {
            let terminal = params.terminal_velocity();
            let fall_time = params.fall_distance() / top;
            let climb_offset = (-terminal
                + (terminal * (terminal - 2.0 * climb / fall_time)).sqrt())
                / -params.fall_gravity();
            base - 0.5 * climb_offset
        };
        control.max(0.0)
    }

    pub fn process_interrupts(
        mut self,
        kin: &mut KinematicState<Vec2>,
        interrupts: &[Interrupt],
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        if interrupts.has(Interrupt::JumpCancelled) && !self.rise.cancelled {
            self.rise.cancel(&self.params, kin);
        }
        jump_interrupts(self.into(), kin, interrupts, player)
    }

    pub fn update_kinematics(
        mut self,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        motion: &mut Vec<KinematicSegment<Vec2>>,
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        if let Some(vx) = self.launch_x.take() {
            kin.velocity.x = vx;
        }

        let params = self.params;
        let aim_x = player.aim().x;
        let locked = (self.control_time - self.elapsed).max(0.0).min(*t);
        self.elapsed += locked;

        let apex = self.rise.ascend(&params, t, kin, motion, |t, x| {
            let mut coast_time = locked;
            *t -= locked;
            let mut segments = curves::coast(&mut coast_time, x);
            segments.extend(curves::walking(&params, t, x, aim_x));
            segments
        });
        if apex {
            Transition::Switch(Falling::new(params).into())
        } else {
            Transition::Stay(MovementState::WallJump(self))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::player::testing::MockPlayer;
    use crate::sim::states::tests::{kin, landing};

    fn step(
        state: MovementState,
        k: &mut KinematicState<Vec2>,
        player: &mut MockPlayer,
    ) -> MovementState {
        let mut t = SIM_DT;
        let mut motion = Vec::new();
        state.fully_update_kinematics(&mut t, k, &mut motion, player)
    }

    #[test]
    fn test_full_jump_reaches_max_height() {
        let params = MovementParameters::default();
        let mut player = MockPlayer::default();
        let mut k = kin((0.0, 0.0), (0.0, 0.0));
        let mut state: MovementState = Jumping::new(params, &k, &mut player).into();

        let mut peak = 0.0_f32;
        for _ in 0..40 {
            state = step(state, &mut k, &mut player);
            peak = peak.max(k.position.y);
        }
        assert!((peak - params.max_jump_height).abs() < 2e-2, "peak {peak}");
        assert_eq!(state.kind(), StateKind::Falling);
    }

    #[test]
    fn test_jump_flushes_buffer() {
        let mut player = MockPlayer {
            jump_buffered: true,
            ..Default::default()
        };
        let k = kin((0.0, 0.0), (0.0, 0.0));
        Jumping::new(MovementParameters::default(), &k, &mut player);
        assert!(!player.jump_buffered);
    }

    #[test]
    fn test_cancelled_jump_gravity() {
        let params = MovementParameters::default();
        let mut player = MockPlayer::default();
        let k0 = kin((0.0, 0.0), (0.0, 0.0));
        let jump = Jumping::new(params, &k0, &mut player);

        // Cancel before the first update: launch velocity over the min height
        let mut k = k0;
        let cancelled = jump
            .process_interrupts(&mut k, &[Interrupt::JumpCancelled], &mut player)
            .into_state();
        assert_eq!(cancelled.kind(), StateKind::CancelledJump);
        let MovementState::Jumping(cancelled) = cancelled else {
            panic!("expected jumping");
        };
        let v = params.jump_velocity();
        let expected = 0.5 * v * v / params.min_jump_height;
        assert!((cancelled.rise.gravity - expected).abs() < 1e-3);
    }

    #[test]
    fn test_cancel_mid_rise_uses_short_hop() {
        let params = MovementParameters::default();
        let mut player = MockPlayer::default();
        let mut jump = Jumping::new(params, &kin((0.0, 0.0), (0.0, 0.0)), &mut player);
        jump.rise.launch = None;

        // Already above the minimum height
        let mut k = kin((0.0, 3.0), (0.0, 8.0));
        let MovementState::Jumping(cancelled) = jump
            .process_interrupts(&mut k, &[Interrupt::JumpCancelled], &mut player)
            .into_state()
        else {
            panic!("expected jumping");
        };
        // remaining = min(0.75, 4 - 3)
        assert!((cancelled.rise.gravity - 0.5 * 64.0 / 0.75).abs() < 1e-3);
    }

    #[test]
    fn test_cancelled_jump_is_lower() {
        let params = MovementParameters::default();
        let mut player = MockPlayer::default();
        let mut k = kin((0.0, 0.0), (0.0, 0.0));
        let mut state: MovementState = Jumping::new(params, &k, &mut player).into();
        state = step(state, &mut k, &mut player);
        state = state
            .process_interrupts(&mut k, &[Interrupt::JumpCancelled], &mut player)
            .into_state();

        let mut peak = 0.0_f32;
        for _ in 0..40 {
            state = step(state, &mut k, &mut player);
            peak = peak.max(k.position.y);
        }
        assert!(peak < params.max_jump_height);
        assert!(peak >= params.min_jump_height - 1e-2, "peak {peak}");
    }

    #[test]
    fn test_landing_mid_jump_walks() {
        let params = MovementParameters::default();
        let mut player = MockPlayer::default();
        let mut k = kin((0.0, 0.0), (0.0, -2.0));
        let jump: MovementState = Jumping::new(params, &k, &mut player).into();
        let next = jump.process_interrupts(&mut k, &[landing()], &mut player);
        assert_eq!(next.into_state().kind(), StateKind::Walking);
    }

    #[test]
    fn test_wall_jump_launch_and_lockout() {
        let params = MovementParameters::default();
        let mut player = MockPlayer {
            // Holding back toward the wall is ignored while locked out
            aim: Vec2::NEG_X,
            ..Default::default()
        };
        let mut k = kin((0.0, 0.0), (0.0, 0.0));
        let jump = WallJump::new(params, 1.0, &k, &mut player);
        assert!(jump.control_time > SIM_DT);

        let state = step(jump.into(), &mut k, &mut player);
        assert_eq!(k.velocity.x, params.top_speed());
        assert!(k.velocity.y > 0.0);
        assert_eq!(state.kind(), StateKind::WallJump);
    }

    #[test]
    fn test_wall_jump_control_time_default() {
        let params = MovementParameters::default();
        // 0.5·(6 - 3·0.5 - 0.5)/10 with no climb offset
        assert!((WallJump::control_time(&params) - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_wall_jump_with_params_before_launch() {
        let params = MovementParameters::default();
        let mut player = MockPlayer::default();
        let k = kin((0.0, 1.0), (0.0, 0.0));
        let boosted = params.grapple_wall_jump(params.impact_speed);
        let jump = WallJump::new(boosted, -1.0, &k, &mut player).with_params(params);

        assert_eq!(jump.launch_x, Some(-params.top_speed()));
        assert_eq!(jump.rise.gravity, params.rise_gravity());
        assert_eq!(jump.rise.start_height, 1.0);
        assert_eq!(jump.control_time, WallJump::control_time(&params));
    }
}
