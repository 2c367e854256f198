//! Movement states
//!
//! Every state is a plain value. Processing interrupts or integrating
//! motion consumes the state and hands back a [`Transition`]: either the
//! (possibly modified) same state or the state to switch to. The rope
//! states wrap another state in a `Box` and delegate to it.

pub mod anchored;
pub mod curves;
pub mod falling;
pub mod grapple;
pub mod grapple_jump;
pub mod jumping;
pub mod swinging;
pub mod walking;

pub use anchored::Anchored;
pub use falling::{Falling, WallSlide};
pub use grapple::{Grapple, Impact};
pub use grapple_jump::{GrappleJump, GrappleJumpKind};
pub use jumping::{Jumping, WallJump};
pub use swinging::{Swinging, WallSwing};
pub use walking::Walking;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::interrupt::{Interrupt, InterruptQuery};
use super::kinematics::{KinematicSegment, KinematicState};
use super::params::MovementParameters;
use super::player::PlayerInfo;
use crate::consts::MAX_TRANSITIONS_PER_UPDATE;
use crate::sign;

/// Reported state label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    Walking,
    Falling,
    Jumping,
    CancelledJump,
    WallJump,
    WallSlide,
    Impact,
    Grapple,
    VerticalGrapple,
    Anchored,
    Swinging,
    WallSwing,
    GrappleJump,
    GrappleWallJump,
    VerticalGrappleJump,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MovementState {
    Walking(Walking),
    Falling(Falling),
    Jumping(Jumping),
    WallJump(WallJump),
    WallSlide(WallSlide),
    Grapple(Grapple),
    Impact(Impact),
    Anchored(Anchored),
    Swinging(Swinging),
    WallSwing(WallSwing),
    GrappleJump(GrappleJump),
}

/// What a state asks the machine to do next
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Keep running this state
    Stay(MovementState),
    /// Hand off to a different state
    Switch(MovementState),
}

impl Transition {
    pub fn into_state(self) -> MovementState {
        match self {
            Transition::Stay(state) | Transition::Switch(state) => state,
        }
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, Transition::Switch(_))
    }

    /// Run `f` on the kept state; switches pass through untouched
    pub fn or_else(self, f: impl FnOnce(MovementState) -> Transition) -> Transition {
        match self {
            Transition::Stay(state) => f(state),
            switch => switch,
        }
    }
}

macro_rules! dispatch {
    ($state:expr, $s:ident => $body:expr) => {
        match $state {
            MovementState::Walking($s) => $body,
            MovementState::Falling($s) => $body,
            MovementState::Jumping($s) => $body,
            MovementState::WallJump($s) => $body,
            MovementState::WallSlide($s) => $body,
            MovementState::Grapple($s) => $body,
            MovementState::Impact($s) => $body,
            MovementState::Anchored($s) => $body,
            MovementState::Swinging($s) => $body,
            MovementState::WallSwing($s) => $body,
            MovementState::GrappleJump($s) => $body,
        }
    };
}

macro_rules! impl_from_state {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for MovementState {
                fn from(state: $variant) -> Self {
                    MovementState::$variant(state)
                }
            }
        )*
    };
}

impl_from_state!(
    Walking, Falling, Jumping, WallJump, WallSlide, Grapple, Impact, Anchored, Swinging,
    WallSwing, GrappleJump,
);

impl MovementState {
    pub fn kind(&self) -> StateKind {
        dispatch!(self, s => s.kind())
    }

    pub fn params(&self) -> MovementParameters {
        dispatch!(self, s => s.params)
    }

    /// Same state driven by a different parameter set
    pub fn with_params(self, params: MovementParameters) -> Self {
        match self {
            MovementState::WallJump(s) => s.with_params(params).into(),
            MovementState::Anchored(s) => s.with_params(params).into(),
            MovementState::GrappleJump(s) => s.with_params(params).into(),
            mut other => {
                dispatch!(&mut other, s => s.params = params);
                other
            }
        }
    }

    /// Rope attachment point, for the states that hang from one
    pub fn anchor(&self) -> Option<Vec2> {
        match self {
            MovementState::Grapple(s) => Some(s.anchor),
            MovementState::Anchored(s) => Some(s.anchor),
            MovementState::Swinging(s) => Some(s.anchor),
            MovementState::WallSwing(s) => Some(s.anchor),
            _ => None,
        }
    }

    pub fn rope_radius(&self) -> Option<f32> {
        match self {
            MovementState::Anchored(s) => s.radius,
            MovementState::Swinging(s) => s.radius,
            MovementState::WallSwing(s) => Some(s.radius),
            _ => None,
        }
    }

    pub fn process_interrupts(
        self,
        kin: &mut KinematicState<Vec2>,
        interrupts: &[Interrupt],
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        dispatch!(self, s => s.process_interrupts(kin, interrupts, player))
    }

    /// Integrate for up to `t`, pushing motion segments and taking the
    /// consumed time off `t`
    pub fn update_kinematics(
        self,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        motion: &mut Vec<KinematicSegment<Vec2>>,
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        dispatch!(self, s => s.update_kinematics(t, kin, motion, player))
    }

    /// Keep integrating and following hand-offs until `t` is used up
    pub fn fully_update_kinematics(
        self,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        motion: &mut Vec<KinematicSegment<Vec2>>,
        player: &mut dyn PlayerInfo,
    ) -> MovementState {
        let mut state = self;
        let mut handoffs = 0;

        while *t > 0.0 {
            let from = state.kind();
            match state.update_kinematics(t, kin, motion, player) {
                Transition::Stay(kept) => {
                    state = kept;
                    if *t > 0.0 {
                        log::warn!("{from:?} stayed with {t}s unconsumed");
                        *t = 0.0;
                    }
                }
                Transition::Switch(next) => {
                    log::debug!("{from:?} -> {:?} with {t}s left", next.kind());
                    state = next;
                    handoffs += 1;
                    if handoffs >= MAX_TRANSITIONS_PER_UPDATE {
                        log::warn!("Dropping {t}s after {handoffs} hand-offs in one update");
                        *t = 0.0;
                    }
                }
            }
        }
        state
    }
}

/// Rope, landing and buffered-jump handling shared by every state
pub(crate) fn common_interrupts(
    state: MovementState,
    kin: &mut KinematicState<Vec2>,
    interrupts: &[Interrupt],
    player: &mut dyn PlayerInfo,
) -> Transition {
    let params = state.params();

    if interrupts.has(Interrupt::AnchorToggled) && !matches!(state, MovementState::Anchored(_)) {
        if let Some(anchor) = player.grapple_raycast() {
            return Transition::Switch(Anchored::wrap(params, anchor, state).into());
        }
    }

    if interrupts.has(Interrupt::GrappleRequested) {
        if let Some(anchor) = player.grapple_raycast() {
            return Transition::Switch(Grapple::new(params, anchor).into());
        }
    }

    if let Some(collision) = interrupts.collision() {
        if collision.normal.x != 0.0 {
            kin.velocity.x = 0.0;
        }
        if collision.normal.y != 0.0 {
            kin.velocity.y = 0.0;
        }

        if collision.is_ground() {
            if player.flush_jump_buffer() {
                return Transition::Switch(Jumping::new(params, kin, player).into());
            }
            if !matches!(state, MovementState::Walking(_) | MovementState::Anchored(_)) {
                return Transition::Switch(Walking::new(params).into());
            }
        }

        if collision.is_wall() && player.flush_jump_buffer() {
            let direction = sign(collision.normal.x);
            return Transition::Switch(WallJump::new(params, direction, kin, player).into());
        }
    }

    Transition::Stay(state)
}

/// Jump off whichever wall is being touched
pub(crate) fn try_wall_jump(
    params: MovementParameters,
    kin: &KinematicState<Vec2>,
    interrupts: &[Interrupt],
    player: &mut dyn PlayerInfo,
) -> Option<MovementState> {
    let wall = player.wall_check();
    if interrupts.jump_started() && wall != 0 {
        Some(WallJump::new(params, wall as f32, kin, player).into())
    } else {
        None
    }
}

/// Start sliding when airborne, pushed into a wall and holding toward it
pub(crate) fn try_wall_slide(
    params: MovementParameters,
    interrupts: &[Interrupt],
    player: &dyn PlayerInfo,
) -> Option<MovementState> {
    let against_wall = interrupts.collision().is_some_and(|c| c.is_wall());
    let holding_in = (player.wall_check() as f32) * player.aim().x < 0.0;
    if !player.ground_check() && against_wall && holding_in {
        Some(WallSlide::new(params).into())
    } else {
        None
    }
}
