//! Fixed timestep player tick
//!
//! Joins one frame of input, the movement state machine and the collision
//! resolver. The machine proposes where the actor wants to be; the resolver
//! decides where it actually ends up, and any collision is fed straight
//! back to the machine before the frame ends.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionConfig, CollisionResolver};
use super::interrupt::{Collision, Interrupt};
use super::kinematics::KinematicState;
use super::machine::{MotionSnapshot, MovementStateMachine};
use super::params::MovementParameters;
use super::player::{JumpBuffer, PlayerInfo};
use super::states::{MovementState, StateKind};
use super::world::{Aabb, CollisionWorld, Level};
use crate::settings::Tuning;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Stick or keyboard direction; x drives walking and swinging
    pub aim: Vec2,
    /// Jump button went down this tick
    pub jump_pressed: bool,
    /// Jump button came up this tick
    pub jump_released: bool,
    /// Attach or release the rope
    pub anchor: bool,
    /// Fire the grapple
    pub grapple: bool,
}

/// Where a renderer should draw the rope
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RopeView {
    pub visible: bool,
    pub anchor: Vec2,
    pub end: Vec2,
}

/// [`PlayerInfo`] backed by a level, valid for one machine update
struct PlayerContext<'a> {
    level: &'a Level,
    resolver: &'a CollisionResolver,
    body: &'a Aabb,
    params: &'a MovementParameters,
    aim: Vec2,
    now: f32,
    jump_buffer: &'a mut JumpBuffer,
    rope: &'a mut RopeView,
}

impl PlayerContext<'_> {
    /// Aim rounded to the nearest allowed rope angle
    fn snapped_aim(&self) -> Option<Vec2> {
        if self.aim == Vec2::ZERO {
            return None;
        }
        let step = self.params.angle_snap_increment().to_radians();
        let angle = (self.aim.y.atan2(self.aim.x) / step).round() * step;
        Some(Vec2::from_angle(angle))
    }
}

impl PlayerInfo for PlayerContext<'_> {
    fn aim(&self) -> Vec2 {
        self.aim
    }

    fn ground_check(&self) -> bool {
        self.resolver
            .touching(self.level, self.body, Vec2::NEG_Y, 0.0)
    }

    fn wall_check(&self) -> i32 {
        let overlap = self.params.wall_check_overlap();
        if self.resolver.touching(self.level, self.body, Vec2::NEG_X, overlap) {
            1
        } else if self.resolver.touching(self.level, self.body, Vec2::X, overlap) {
            -1
        } else {
            0
        }
    }

    fn grapple_raycast(&mut self) -> Option<Vec2> {
        let direction = self.snapped_aim()?;
        let start = self.body.center;
        let hit = self
            .level
            .linecast(start, start + direction * self.params.rope_length)?;
        if !hit.grapple {
            log::trace!("Rope hit a non-grappleable block at {:?}", hit.point);
            return None;
        }
        Some(hit.point)
    }

    fn flush_jump_buffer(&mut self) -> bool {
        self.jump_buffer
            .flush(self.now, self.params.jump_buffer_duration())
    }

    fn draw_rope(&mut self, anchor: Vec2, position: Vec2) {
        self.rope.anchor = anchor;
        self.rope.end = position;
    }

    fn show_rope(&mut self, visible: bool) {
        self.rope.visible = visible;
    }
}

/// One actor moving through a level
#[derive(Debug, Clone)]
pub struct PlayerController {
    params: MovementParameters,
    resolver: CollisionResolver,
    /// Collision box; its centre is the kinematic position
    body: Aabb,
    kinematics: KinematicState<Vec2>,
    machine: MovementStateMachine,
    interrupts: Vec<Interrupt>,
    jump_buffer: JumpBuffer,
    aim: Vec2,
    rope: RopeView,
    /// Sim clock, used by the jump buffer
    time: f32,
    last_collision: Option<Collision>,
}

impl PlayerController {
    /// Actor standing with its feet at `feet`
    pub fn new(tuning: &Tuning, feet: Vec2) -> Self {
        let size = tuning.actor_size();
        let body = Aabb::new(feet + Vec2::new(0.0, size.y * 0.5), size);
        Self {
            params: tuning.movement,
            resolver: CollisionResolver::new(tuning.collision),
            body,
            kinematics: KinematicState::new(body.center, Vec2::ZERO),
            machine: MovementStateMachine::new(tuning.movement),
            interrupts: Vec::new(),
            jump_buffer: JumpBuffer::default(),
            aim: Vec2::ZERO,
            rope: RopeView::default(),
            time: 0.0,
            last_collision: None,
        }
    }

    /// Actor at the level's spawn marker, or the origin without one
    pub fn spawn(tuning: &Tuning, level: &Level) -> Self {
        let feet = level.spawn.unwrap_or_else(|| {
            log::warn!("Level has no spawn point; starting at the origin");
            Vec2::ZERO
        });
        Self::new(tuning, feet)
    }

    pub fn position(&self) -> Vec2 {
        self.kinematics.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.kinematics.velocity
    }

    pub fn body(&self) -> &Aabb {
        &self.body
    }

    pub fn state(&self) -> &MovementState {
        self.machine.state()
    }

    pub fn kind(&self) -> StateKind {
        self.machine.kind()
    }

    pub fn snapshot(&self) -> &MotionSnapshot {
        self.machine.snapshot()
    }

    pub fn rope(&self) -> &RopeView {
        &self.rope
    }

    pub fn last_collision(&self) -> Option<Collision> {
        self.last_collision
    }

    pub fn params(&self) -> &MovementParameters {
        &self.params
    }

    pub fn collision_config(&self) -> &CollisionConfig {
        &self.resolver.config
    }

    /// Retune while running; the current state picks the new values up
    pub fn set_params(&mut self, params: MovementParameters) {
        self.params = params;
        self.machine.set_params(params);
    }

    /// Advance the actor by one fixed timestep
    pub fn tick(&mut self, level: &Level, input: &TickInput, dt: f32) {
        self.time += dt;
        self.aim = input.aim;

        if input.jump_pressed {
            self.jump_buffer.record(self.time);
            self.interrupts.push(Interrupt::JumpStarted);
        }
        if input.jump_released {
            self.interrupts.push(Interrupt::JumpCancelled);
        }
        if input.anchor {
            self.interrupts.push(Interrupt::AnchorToggled);
        }
        if input.grapple {
            self.interrupts.push(Interrupt::GrappleRequested);
        }

        self.update_machine(level, dt);

        let desired = self.kinematics.position - self.body.center;
        let resolution = self.resolver.collide(level, &mut self.body, desired);
        self.kinematics.position = self.body.center;
        self.last_collision = resolution.collision;

        if let Some(collision) = resolution.collision {
            self.interrupts.push(Interrupt::Collision(collision));
            self.update_machine(level, 0.0);
        }
    }

    fn update_machine(&mut self, level: &Level, t: f32) {
        let mut context = PlayerContext {
            level,
            resolver: &self.resolver,
            body: &self.body,
            params: &self.params,
            aim: self.aim,
            now: self.time,
            jump_buffer: &mut self.jump_buffer,
            rope: &mut self.rope,
        };
        self.machine
            .update(t, &mut self.kinematics, &mut self.interrupts, &mut context);
    }
}
