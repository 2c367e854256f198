//! Static level geometry
//!
//! Axis-aligned blocks and the single linecast query the resolver and the
//! player context are built on.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half_extents: size * 0.5,
        }
    }

    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.center += offset;
    }

    /// Overlap along each axis (zero or negative components mean separated)
    pub fn overlap(&self, other: &Aabb) -> Vec2 {
        let a = self.max().min(other.max());
        let b = self.min().max(other.min());
        a - b
    }

    /// Strictly inside (points on the boundary are outside)
    pub fn contains(&self, point: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x > min.x && point.x < max.x && point.y > min.y && point.y < max.y
    }

    /// Earliest entry of the segment `start..end`, as (fraction, entry normal).
    ///
    /// A segment starting inside the box hits at fraction zero with a zero
    /// normal. Grazing contact along a face is not a hit.
    pub fn segment_entry(&self, start: Vec2, end: Vec2) -> Option<(f32, Vec2)> {
        let delta = end - start;
        let (min, max) = (self.min(), self.max());
        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;
        let mut normal = Vec2::ZERO;

        for axis in 0..2 {
            let d = delta[axis];
            if d.abs() < f32::EPSILON {
                if start[axis] <= min[axis] || start[axis] >= max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut near = (min[axis] - start[axis]) * inv;
            let mut far = (max[axis] - start[axis]) * inv;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            if near > t_min {
                t_min = near;
                normal = Vec2::ZERO;
                normal[axis] = -crate::sign(d);
            }
            t_max = t_max.min(far);
            if t_min >= t_max {
                return None;
            }
        }
        Some((t_min, normal))
    }
}

/// A solid level block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub bounds: Aabb,
    /// Whether the rope can attach to this block
    pub grapple: bool,
}

/// Result of a linecast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec2,
    pub normal: Vec2,
    /// Distance from the cast start
    pub distance: f32,
    pub grapple: bool,
}

/// Anything the collision resolver can cast lines against
pub trait CollisionWorld {
    /// First surface crossed travelling from `start` to `end`.
    ///
    /// Starting inside geometry reports a hit at distance zero whose normal
    /// opposes the cast direction.
    fn linecast(&self, start: Vec2, end: Vec2) -> Option<RayHit>;
}

/// Static geometry for one level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub blocks: Vec<Block>,
    /// Actor spawn (bottom centre of the marked tile)
    pub spawn: Option<Vec2>,
}

impl Level {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            spawn: None,
        }
    }

    /// Build from rows of text, top row first.
    ///
    /// `#` is a grappleable tile, `=` a solid tile the rope slides off,
    /// `P` the spawn point. Runs of equal tiles in a row become one block.
    pub fn from_ascii(rows: &[&str], tile_size: f32) -> Self {
        let mut level = Level::default();
        let height = rows.len();

        for (row_index, row) in rows.iter().enumerate() {
            let y0 = (height - 1 - row_index) as f32 * tile_size;
            let mut run: Option<(usize, char)> = None;
            let chars: Vec<char> = row.chars().collect();

            for col in 0..=chars.len() {
                let tile = chars.get(col).copied().unwrap_or(' ');
                if tile == 'P' {
                    level.spawn = Some(Vec2::new((col as f32 + 0.5) * tile_size, y0));
                }
                let solid = matches!(tile, '#' | '=');
                match run {
                    Some((_, kind)) if solid && kind == tile => {}
                    _ => {
                        if let Some((start, kind)) = run.take() {
                            level.blocks.push(Block {
                                bounds: Aabb::from_min_max(
                                    Vec2::new(start as f32 * tile_size, y0),
                                    Vec2::new(col as f32 * tile_size, y0 + tile_size),
                                ),
                                grapple: kind == '#',
                            });
                        }
                        if solid {
                            run = Some((col, tile));
                        }
                    }
                }
            }
        }

        log::debug!("Built level with {} blocks", level.blocks.len());
        level
    }

    /// Deepest overlap between `body` and any block, per axis
    pub fn max_penetration(&self, body: &Aabb) -> f32 {
        self.blocks
            .iter()
            .map(|b| body.overlap(&b.bounds))
            .filter(|o| o.x > 0.0 && o.y > 0.0)
            .map(|o| o.x.min(o.y))
            .fold(0.0, f32::max)
    }
}

impl CollisionWorld for Level {
    fn linecast(&self, start: Vec2, end: Vec2) -> Option<RayHit> {
        let delta = end - start;
        let length = delta.length();

        self.blocks
            .iter()
            .filter_map(|block| {
                let (fraction, normal) = block.bounds.segment_entry(start, end)?;
                let normal = if normal == Vec2::ZERO {
                    -delta.normalize_or_zero()
                } else {
                    normal
                };
                Some(RayHit {
                    point: start + delta * fraction,
                    normal,
                    distance: fraction * length,
                    grapple: block.grapple,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
