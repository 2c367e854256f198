use glam::Vec2;

use super::anchored::anchored_radius;
use super::{
    Falling, Grapple, Jumping, MovementState, StateKind, Transition, common_interrupts,
};
use crate::sim::interrupt::{Interrupt, InterruptQuery};
use crate::sim::kinematics::{KinematicSegment, KinematicState};
use crate::sim::params::MovementParameters;
use crate::sim::pendulum::Pendulum;
use crate::sim::player::PlayerInfo;
use crate::{rotate_from_down, sign, signed_angle};

/// Angle from straight down and angular velocity around `anchor`
fn rope_angle(anchor: Vec2, radius: f32, kin: &KinematicState<Vec2>) -> Option<(f64, f64)> {
    let offset = kin.position - anchor;
    let rope = offset.try_normalize()?;
    let angle = signed_angle(Vec2::NEG_Y, rope);
    let angular_velocity = kin.velocity.dot(rope.perp()) / radius;
    Some((angle as f64, angular_velocity as f64))
}

/// Put the actor on the rope circle at `angle`, moving tangentially
fn place_on_rope(
    anchor: Vec2,
    radius: f32,
    angle: f64,
    angular_velocity: f64,
    kin: &mut KinematicState<Vec2>,
) {
    let rope = rotate_from_down(angle as f32);
    kin.position = anchor + rope * radius;
    kin.velocity = rope.perp() * (angular_velocity as f32 * radius);
}

/// Jump, release and grapple handling shared by the swings
fn swing_interrupts(
    state: MovementState,
    anchor: Vec2,
    radius: f32,
    kin: &mut KinematicState<Vec2>,
    interrupts: &[Interrupt],
    player: &mut dyn PlayerInfo,
) -> Transition {
    let params = state.params();
    let wall = player.wall_check();

    if interrupts.jump_started() {
        let next: MovementState = if wall != 0 {
            WallSwing::new(params, anchor, radius, wall as f32).into()
        } else {
            Jumping::new(params, kin, player).into()
        };
        return Transition::Switch(next);
    }
    if interrupts.has(Interrupt::AnchorToggled) {
        return Transition::Switch(Falling::new(params).into());
    }
    if interrupts.has(Interrupt::GrappleRequested) {
        let grapple = if wall != 0 {
            Grapple::vertical(params, anchor)
        } else {
            Grapple::new(params, anchor)
        };
        return Transition::Switch(grapple.into());
    }
    common_interrupts(state, kin, interrupts, player)
}

/// Hanging from a taut rope, pumped by horizontal aim
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swinging {
    pub params: MovementParameters,
    pub anchor: Vec2,
    /// Fixed on the first update unless inherited from the rope
    pub radius: Option<f32>,
}

impl Swinging {
    pub fn new(params: MovementParameters, anchor: Vec2) -> Self {
        Self {
            params,
            anchor,
            radius: None,
        }
    }

    pub fn with_radius(params: MovementParameters, anchor: Vec2, radius: f32) -> Self {
        Self {
            radius: Some(radius),
            ..Self::new(params, anchor)
        }
    }

    pub fn kind(&self) -> StateKind {
        StateKind::Swinging
    }

    fn radius_at(&self, kin: &KinematicState<Vec2>) -> f32 {
        self.radius
            .unwrap_or_else(|| anchored_radius(&self.params, kin.position, self.anchor))
    }

    pub fn process_interrupts(
        self,
        kin: &mut KinematicState<Vec2>,
        interrupts: &[Interrupt],
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let (anchor, radius) = (self.anchor, self.radius_at(kin));
        swing_interrupts(self.into(), anchor, radius, kin, interrupts, player)
    }

    pub fn update_kinematics(
        mut self,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        _motion: &mut Vec<KinematicSegment<Vec2>>,
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let params = self.params;
        let radius = self.radius_at(kin);
        self.radius = Some(radius);

        let Some((angle, angular_velocity)) = rope_angle(self.anchor, radius, kin) else {
            log::warn!("Swinging from the anchor point itself; dropping");
            return Transition::Switch(Falling::new(params).into());
        };

        let pendulum = Pendulum::new(params.fall_gravity(), radius, params.dead_swing_count);
        let drive = pendulum.clamped_drive(
            angle,
            angular_velocity,
            (params.angular_acceleration.to_radians() * player.aim().x) as f64,
            params.max_swing_angle.to_radians() as f64,
        );
        let swing = pendulum.oscillation(angle, angular_velocity, drive);

        let dt = *t as f64;
        *t = 0.0;
        place_on_rope(
            self.anchor,
            radius,
            swing.angle(dt),
            swing.angular_velocity(dt),
            kin,
        );

        player.show_rope(true);
        player.draw_rope(self.anchor, kin.position);
        Transition::Stay(MovementState::Swinging(self))
    }
}

/// Push off a wall while roped: an undamped swing up to a fixed peak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallSwing {
    pub params: MovementParameters,
    pub anchor: Vec2,
    pub radius: f32,
    /// Initial angular direction (+1 swings toward +x at the bottom)
    pub direction: f32,
    launched: bool,
}

impl WallSwing {
    pub fn new(params: MovementParameters, anchor: Vec2, radius: f32, direction: f32) -> Self {
        Self {
            params,
            anchor,
            radius,
            direction,
            launched: false,
        }
    }

    pub fn kind(&self) -> StateKind {
        StateKind::WallSwing
    }

    fn swinging(&self) -> MovementState {
        Swinging::with_radius(self.params, self.anchor, self.radius).into()
    }

    pub fn process_interrupts(
        self,
        kin: &mut KinematicState<Vec2>,
        interrupts: &[Interrupt],
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        if interrupts.collision().is_some() || interrupts.has(Interrupt::JumpCancelled) {
            return Transition::Switch(self.swinging());
        }
        let (anchor, radius) = (self.anchor, self.radius);
        swing_interrupts(self.into(), anchor, radius, kin, interrupts, player)
    }

    pub fn update_kinematics(
        mut self,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        _motion: &mut Vec<KinematicSegment<Vec2>>,
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let Some((angle, angular_velocity)) = rope_angle(self.anchor, self.radius, kin) else {
            return Transition::Switch(self.swinging());
        };

        let heading = if self.launched {
            sign(angular_velocity as f32)
        } else {
            self.launched = true;
            self.direction
        };
        let heading = match heading {
            0.0 => sign(angle as f32),
            h => h,
        };

        let pendulum = Pendulum::ideal(self.params.rise_gravity(), self.radius);
        let max_angle = self.params.wall_swing_max_angle.to_radians() as f64;
        let swing = pendulum.swing_to_peak(angle, heading as f64, max_angle);
        let peak_time = swing.next_peak_time() as f32;

        player.show_rope(true);
        if *t >= peak_time {
            place_on_rope(self.anchor, self.radius, swing.angle(peak_time as f64), 0.0, kin);
            *t -= peak_time;
            player.draw_rope(self.anchor, kin.position);
            return Transition::Switch(self.swinging());
        }

        let dt = *t as f64;
        *t = 0.0;
        place_on_rope(
            self.anchor,
            self.radius,
            swing.angle(dt),
            swing.angular_velocity(dt),
            kin,
        );
        player.draw_rope(self.anchor, kin.position);
        Transition::Stay(MovementState::WallSwing(self))
    }
}
