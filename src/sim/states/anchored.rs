use glam::Vec2;

use super::{Grapple, MovementState, StateKind, Swinging, Transition, common_interrupts};
use crate::consts::ROOT_EPSILON;
use crate::sim::interrupt::{Interrupt, InterruptQuery};
use crate::sim::kinematics::{KinematicSegment, KinematicState};
use crate::sim::params::MovementParameters;
use crate::sim::player::PlayerInfo;
use crate::sim::polynomial::{min_root_in, solve_quadratic, solve_quartic};

/// Rope length for an attachment made at `position`
pub(crate) fn anchored_radius(params: &MovementParameters, position: Vec2, anchor: Vec2) -> f32 {
    params.min_rope_length().max(position.distance(anchor))
}

/// Roped to an anchor while some other state drives the motion.
///
/// The wrapped state runs unchanged until it would carry the actor past
/// the rope length. The update is then replayed up to the moment the rope
/// went taut, and the rope decides what happens next.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchored {
    pub params: MovementParameters,
    pub anchor: Vec2,
    /// Fixed on the first update
    pub radius: Option<f32>,
    pub inner: Box<MovementState>,
}

impl Anchored {
    /// Attach to `anchor` around `previous`; re-anchoring replaces the old rope
    pub fn wrap(params: MovementParameters, anchor: Vec2, previous: MovementState) -> Self {
        let inner = match previous {
            MovementState::Anchored(anchored) => anchored.inner,
            other => Box::new(other),
        };
        Self {
            params,
            anchor,
            radius: None,
            inner,
        }
    }

    pub fn kind(&self) -> StateKind {
        StateKind::Anchored
    }

    pub fn with_params(self, params: MovementParameters) -> Self {
        Self {
            params,
            inner: Box::new((*self.inner).with_params(params)),
            ..self
        }
    }

    pub fn process_interrupts(
        mut self,
        kin: &mut KinematicState<Vec2>,
        interrupts: &[Interrupt],
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        if interrupts.has(Interrupt::AnchorToggled) {
            player.show_rope(false);
            return Transition::Switch(*self.inner);
        }
        if interrupts.has(Interrupt::GrappleRequested) {
            return Transition::Switch(Grapple::new(self.params, self.anchor).into());
        }

        let nested = interrupts.without_anchor();
        self.inner = Box::new(
            (*self.inner)
                .process_interrupts(kin, &nested, player)
                .into_state(),
        );
        common_interrupts(self.into(), kin, interrupts, player)
    }

    pub fn update_kinematics(
        mut self,
        t: &mut f32,
        kin: &mut KinematicState<Vec2>,
        motion: &mut Vec<KinematicSegment<Vec2>>,
        player: &mut dyn PlayerInfo,
    ) -> Transition {
        let anchor = self.anchor;
        let radius = *self
            .radius
            .get_or_insert_with(|| anchored_radius(&self.params, kin.position, anchor));

        let initial_inner = (*self.inner).clone();
        let initial_kin = *kin;
        let initial_t = *t;

        let mut local = Vec::new();
        let inner = (*self.inner).fully_update_kinematics(t, kin, &mut local, player);

        let distance = kin.position.distance(anchor);
        let moving_away = distance - initial_kin.position.distance(anchor) > 0.0;
        if distance >= radius && moving_away {
            let mut move_time = taut_time(anchor, radius, &initial_kin, kin, &local, initial_t);
            let taken = move_time;
            log::trace!("Rope taut after {taken}s of {initial_t}s");

            *kin = initial_kin;
            local.clear();
            let inner =
                initial_inner.fully_update_kinematics(&mut move_time, kin, &mut local, player);
            motion.extend(local);
            *t = (initial_t - taken).max(0.0);

            if kin.velocity.y < 0.0 {
                let swing = Swinging::with_radius(self.params, anchor, radius);
                return Transition::Switch(swing.into());
            }
            if kin.velocity.y > 0.0 {
                return Transition::Switch(inner);
            }
            kin.velocity = Vec2::ZERO;
            *t = 0.0;
            self.inner = Box::new(inner);
        } else {
            motion.extend(local);
            self.inner = Box::new(inner);
        }

        player.show_rope(true);
        player.draw_rope(anchor, kin.position);
        Transition::Stay(MovementState::Anchored(self))
    }
}

/// Earliest time the recorded motion reaches the rope circle.
///
/// Each segment is tested exactly with a quartic; if none crosses, the
/// straight line from start to end of the frame is used instead.
fn taut_time(
    anchor: Vec2,
    radius: f32,
    initial: &KinematicState<Vec2>,
    end: &KinematicState<Vec2>,
    segments: &[KinematicSegment<Vec2>],
    frame_time: f32,
) -> f32 {
    let r2 = (radius as f64).powi(2);
    let mut elapsed = 0.0;

    for segment in segments {
        let p = (segment.initial.position - anchor).as_dvec2();
        let v = segment.initial.velocity.as_dvec2();
        let a = segment.acceleration.as_dvec2();

        let roots = solve_quartic(
            0.25 * a.length_squared(),
            a.dot(v),
            v.length_squared() + a.dot(p),
            2.0 * v.dot(p),
            p.length_squared() - r2,
        );
        let duration = segment.duration as f64;
        if let Some(hit) = min_root_in(&roots, -ROOT_EPSILON, duration) {
            return elapsed + hit.max(0.0) as f32;
        }
        elapsed += segment.duration;
    }

    let d = (end.position - initial.position).as_dvec2();
    let f = (initial.position - anchor).as_dvec2();
    solve_quadratic(d.length_squared(), 2.0 * f.dot(d), f.length_squared() - r2)
        .into_iter()
        .max_by(f64::total_cmp)
        .map_or(0.0, |s| (s as f32 * frame_time).clamp(0.0, frame_time))
}
