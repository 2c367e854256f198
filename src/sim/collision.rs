//! Collision resolution for the actor's bounding box
//!
//! The tricky part of the motion engine: turning a desired displacement into
//! an allowed one by sweeping fans of parallel linecasts across the leading
//! faces, plus a diagonal cast from the leading corner. Vertical-only stops
//! against a ceiling get a "ledge nudge" so a jump that clips a corner slides
//! past it instead of bonking.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::interrupt::Collision;
use super::world::{Aabb, CollisionWorld, RayHit};
use crate::sign;

/// Resolver tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Gap kept between the actor and any surface
    pub skin: f32,
    /// Largest spacing between parallel casts on one face
    pub max_raycast_offset: f32,
    /// Largest sideways correction a ledge nudge may apply
    pub max_nudge_distance: f32,
    /// Nudges attempted per resolution before falling back to a plain stop
    pub max_nudges: u32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            skin: 0.001,
            max_raycast_offset: 1.0,
            max_nudge_distance: 0.5,
            max_nudges: 4,
        }
    }
}

/// Result of a resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// How far the body actually moved
    pub displacement: Vec2,
    /// Final deflection report, if anything was hit
    pub collision: Option<Collision>,
}

impl Resolution {
    pub fn free(displacement: Vec2) -> Self {
        Self {
            displacement,
            collision: None,
        }
    }
}

/// Snap a normal to the nearest axis-aligned unit vector
pub fn snap_normal(normal: Vec2) -> Vec2 {
    if normal.x.abs() >= normal.y.abs() {
        Vec2::new(sign(normal.x), 0.0)
    } else {
        Vec2::new(0.0, sign(normal.y))
    }
}

/// Correction that pulls a cast ending at `end` back out of the surface it hit
fn hit_deflection(hit: &RayHit, end: Vec2) -> Vec2 {
    let normal = snap_normal(hit.normal);
    let penetration = hit.point - end;
    penetration.dot(normal) * normal
}

fn keep_larger(current: f32, candidate: f32) -> f32 {
    if candidate.abs() > current.abs() {
        candidate
    } else {
        current
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollisionResolver {
    pub config: CollisionConfig,
}

impl CollisionResolver {
    pub fn new(config: CollisionConfig) -> Self {
        Self { config }
    }

    /// Move `body` by as much of `displacement` as the world allows.
    ///
    /// The body is moved in place, including any partial moves made while
    /// nudging around a ledge.
    pub fn collide<W: CollisionWorld + ?Sized>(
        &self,
        world: &W,
        body: &mut Aabb,
        displacement: Vec2,
    ) -> Resolution {
        let start = body.center;
        let deflection = self.move_with_nudge(world, body, displacement, 0);
        let moved = body.center - start;

        if deflection == Vec2::ZERO {
            return Resolution::free(moved);
        }
        log::trace!("Deflected {displacement:?} by {deflection:?}");
        Resolution {
            displacement: moved,
            collision: Some(Collision::along(displacement, deflection)),
        }
    }

    /// Whether the face of `body` pointing along `direction` is within
    /// `overlap` of a surface
    pub fn touching<W: CollisionWorld + ?Sized>(
        &self,
        world: &W,
        body: &Aabb,
        direction: Vec2,
        overlap: f32,
    ) -> bool {
        let dir = snap_normal(direction);
        if dir == Vec2::ZERO {
            return false;
        }
        let offset = overlap + 2.0 * self.config.skin;
        let (min, max) = (body.min(), body.max());

        let (start, end) = if dir.x != 0.0 {
            let x = if dir.x > 0.0 { max.x } else { min.x } + dir.x * offset;
            (Vec2::new(x, min.y), Vec2::new(x, max.y))
        } else {
            let y = if dir.y > 0.0 { max.y } else { min.y } + dir.y * offset;
            (Vec2::new(min.x, y), Vec2::new(max.x, y))
        };
        world.linecast(start, end).is_some()
    }

    /// Parallel casts across the leading faces, each extended by the skin
    fn axis_aligned_casts(&self, body: &Aabb, displacement: Vec2) -> Vec<(Vec2, Vec2)> {
        let skin = self.config.skin;
        let spacing = self.config.max_raycast_offset.max(f32::EPSILON);
        let (min, max, size) = (body.min(), body.max(), body.size());
        let (sx, sy) = (sign(displacement.x), sign(displacement.y));
        let mut casts = Vec::new();

        if sx != 0.0 {
            let x = if sx > 0.0 { max.x } else { min.x };
            let count = (size.y / spacing).ceil() as usize + 1;
            let reach = Vec2::new(displacement.x + sx * skin, 0.0);
            for i in 0..count {
                let y = min.y + size.y * i as f32 / (count - 1) as f32;
                let start = Vec2::new(x, y);
                casts.push((start, start + reach));
            }
        }

        if sy != 0.0 {
            let y = if sy > 0.0 { max.y } else { min.y };
            let count = (size.x / spacing).ceil() as usize + 1;
            let reach = Vec2::new(0.0, displacement.y + sy * skin);
            for i in 0..count {
                let x = min.x + size.x * i as f32 / (count - 1) as f32;
                let start = Vec2::new(x, y);
                casts.push((start, start + reach));
            }
        }

        casts
    }

    /// Diagonal cast from the leading corner; diagonal moves only.
    ///
    /// A miss still probes one skin past the end of the move along each axis
    /// so a corner that would be grazed is caught.
    fn leading_corner_deflection<W: CollisionWorld + ?Sized>(
        &self,
        world: &W,
        body: &Aabb,
        displacement: Vec2,
    ) -> Vec2 {
        let skin = self.config.skin;
        let (sx, sy) = (sign(displacement.x), sign(displacement.y));
        let corner = body.center + Vec2::new(sx, sy) * body.half_extents;
        let end = corner + displacement;

        if let Some(hit) = world.linecast(corner, end) {
            let normal = snap_normal(hit.normal);
            return hit_deflection(&hit, end) + skin * normal;
        }

        for probe in [Vec2::new(sx * skin, 0.0), Vec2::new(0.0, sy * skin)] {
            if let Some(hit) = world.linecast(end, end + probe) {
                return hit_deflection(&hit, end + probe);
            }
        }
        Vec2::ZERO
    }

    /// Most restrictive correction per axis for moving `body` by `displacement`
    fn deflection<W: CollisionWorld + ?Sized>(
        &self,
        world: &W,
        body: &Aabb,
        displacement: Vec2,
    ) -> Vec2 {
        let mut deflection = Vec2::ZERO;

        for (start, end) in self.axis_aligned_casts(body, displacement) {
            if let Some(hit) = world.linecast(start, end) {
                let d = hit_deflection(&hit, end);
                deflection.x = keep_larger(deflection.x, d.x);
                deflection.y = keep_larger(deflection.y, d.y);
            }
        }

        if displacement.x != 0.0 && displacement.y != 0.0 {
            let d = self.leading_corner_deflection(world, body, displacement);
            deflection.x = keep_larger(deflection.x, d.x);
            deflection.y = keep_larger(deflection.y, d.y);
        }

        deflection
    }

    fn move_with_nudge<W: CollisionWorld + ?Sized>(
        &self,
        world: &W,
        body: &mut Aabb,
        displacement: Vec2,
        depth: u32,
    ) -> Vec2 {
        let deflection = self.deflection(world, body, displacement);

        let ceiling_only = deflection.x == 0.0 && deflection.y < 0.0;
        if !ceiling_only || displacement.y == 0.0 || depth >= self.config.max_nudges {
            body.translate(displacement + deflection);
            return deflection;
        }

        match self.ledge_nudge(world, body, displacement, deflection) {
            Some((before, nudge)) => {
                body.translate(before);
                let blocked = self.deflection(world, body, nudge);
                if blocked.x != 0.0 {
                    body.translate(nudge + blocked);
                    return blocked + Vec2::new(0.0, deflection.y);
                }
                body.translate(nudge);
                let after = Vec2::new(
                    -deflection.y / displacement.y * displacement.x,
                    -deflection.y,
                );
                self.move_with_nudge(world, body, after, depth + 1)
            }
            None => {
                body.translate(displacement + deflection);
                deflection
            }
        }
    }

    /// Sideways correction around a ceiling clipped by the top edge.
    ///
    /// Returns the part of the move made before the ceiling would be reached
    /// and the horizontal nudge to apply there.
    fn ledge_nudge<W: CollisionWorld + ?Sized>(
        &self,
        world: &W,
        body: &Aabb,
        displacement: Vec2,
        deflection: Vec2,
    ) -> Option<(Vec2, Vec2)> {
        let skin = self.config.skin;
        let (min, max) = (body.min(), body.max());
        let width = max.x - min.x;
        let vertical_before = displacement.y + deflection.y;
        let y = max.y + vertical_before + 2.0 * skin;

        let from_right = world
            .linecast(Vec2::new(max.x, y), Vec2::new(min.x, y))
            .map_or(0.0, |h| h.distance);
        let from_left = world
            .linecast(Vec2::new(min.x, y), Vec2::new(max.x, y))
            .map_or(0.0, |h| h.distance);

        let clear_run = from_right.max(from_left);
        if clear_run <= 0.0 {
            return None;
        }
        let overlap = width - clear_run;

        let before = Vec2::new(
            vertical_before / displacement.y * displacement.x,
            vertical_before,
        );
        let edge = if from_right > from_left {
            overlap + skin
        } else {
            -overlap - skin
        };
        let nudge = Vec2::new(edge - before.x, 0.0);

        if nudge.x.abs() > self.config.max_nudge_distance || displacement.x * nudge.x < 0.0 {
            return None;
        }
        log::trace!("Ledge nudge {:.4}", nudge.x);
        Some((before, nudge))
    }
}
