//! Per-frame driver for the movement states
//!
//! Each update runs the discrete pass (interrupts) first, then integrates
//! until the frame time is used up, following as many hand-offs as needed.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::interrupt::Interrupt;
use super::kinematics::{KinematicSegment, KinematicState};
use super::params::MovementParameters;
use super::player::PlayerInfo;
use super::states::{MovementState, StateKind, Walking};
use crate::signed_angle;

/// Read-only view of the current state for animation and camera code
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSnapshot {
    pub kind: StateKind,
    pub anchor: Option<Vec2>,
    pub rope_radius: Option<f32>,
    /// Radians from straight below the anchor, counter-clockwise positive
    pub angle: Option<f32>,
    pub angular_velocity: Option<f32>,
}

impl MotionSnapshot {
    pub fn capture(state: &MovementState, kin: &KinematicState<Vec2>) -> Self {
        let anchor = state.anchor();
        let rope = anchor
            .map(|a| kin.position - a)
            .filter(|offset| *offset != Vec2::ZERO);

        let angle = rope.map(|offset| signed_angle(Vec2::NEG_Y, offset));
        let angular_velocity =
            rope.map(|offset| kin.velocity.dot(offset.perp()) / offset.length_squared());

        Self {
            kind: state.kind(),
            anchor,
            rope_radius: state.rope_radius(),
            angle,
            angular_velocity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MovementStateMachine {
    state: MovementState,
    /// Motion integrated by the last update
    motion: Vec<KinematicSegment<Vec2>>,
    snapshot: MotionSnapshot,
}

impl MovementStateMachine {
    /// Start on foot
    pub fn new(params: MovementParameters) -> Self {
        Self::with_state(Walking::new(params).into())
    }

    pub fn with_state(state: MovementState) -> Self {
        let at_rest = KinematicState::new(Vec2::ZERO, Vec2::ZERO);
        let snapshot = MotionSnapshot::capture(&state, &at_rest);
        Self {
            state,
            motion: Vec::new(),
            snapshot,
        }
    }

    pub fn state(&self) -> &MovementState {
        &self.state
    }

    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    pub fn motion(&self) -> &[KinematicSegment<Vec2>] {
        &self.motion
    }

    pub fn snapshot(&self) -> &MotionSnapshot {
        &self.snapshot
    }

    /// Swap the parameter set the current state runs on
    pub fn set_params(&mut self, params: MovementParameters) {
        let state = self.take_state();
        self.state = state.with_params(params);
    }

    fn take_state(&mut self) -> MovementState {
        let params = self.state.params();
        std::mem::replace(&mut self.state, Walking::new(params).into())
    }

    /// Advance by `t` seconds.
    ///
    /// The discrete pass runs every update, even with no interrupts, so
    /// states can react to losing the ground. `interrupts` is drained. A
    /// zero `t` only runs the discrete pass.
    pub fn update(
        &mut self,
        t: f32,
        kin: &mut KinematicState<Vec2>,
        interrupts: &mut Vec<Interrupt>,
        player: &mut dyn PlayerInfo,
    ) {
        let from = self.state.kind();
        let was_roped = self.state.anchor().is_some();
        let mut state = self.take_state();

        if !interrupts.is_empty() {
            log::trace!("{from:?} handling {interrupts:?}");
        }
        state = state.process_interrupts(kin, interrupts, player).into_state();
        interrupts.clear();

        self.motion.clear();
        let mut remaining = t.max(0.0);
        state = state.fully_update_kinematics(&mut remaining, kin, &mut self.motion, player);

        if was_roped && state.anchor().is_none() {
            player.show_rope(false);
        }
        if state.kind() != from {
            log::debug!("Movement state {from:?} -> {:?}", state.kind());
        }

        self.snapshot = MotionSnapshot::capture(&state, kin);
        self.state = state;
    }
}
