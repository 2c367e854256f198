//! Discrete events consumed by the movement states
//!
//! Input edges and collision reports accumulate between integration steps
//! and are handed to the current state once, then cleared.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Outcome of resolving a displacement against static geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    /// Unit direction of the deflection (away from the surfaces hit)
    pub normal: Vec2,
    /// Correction carried back along the desired displacement
    pub deflection: Vec2,
    /// How far the desired displacement would have gone into the surface
    pub penetration: Vec2,
}

impl Collision {
    pub fn from_deflection(deflection: Vec2) -> Self {
        Self {
            normal: deflection.normalize_or_zero(),
            deflection,
            penetration: -deflection,
        }
    }

    /// Report a resolved move. The correction is carried back along
    /// `displacement`, scaled by its dominant axis; the normal comes from the
    /// raw per-axis `deflection`.
    pub fn along(displacement: Vec2, deflection: Vec2) -> Self {
        let ratio = if deflection.x.abs() > deflection.y.abs() {
            deflection.x / displacement.x
        } else {
            deflection.y / displacement.y
        };
        // Zero travel on the dominant axis, e.g. after a nudge
        let projected = if ratio.is_finite() {
            displacement * ratio
        } else {
            deflection
        };
        Self {
            normal: deflection.normalize_or_zero(),
            deflection: projected,
            penetration: -projected,
        }
    }

    /// Landed on something walkable
    pub fn is_ground(&self) -> bool {
        self.normal.dot(Vec2::Y) > 0.5
    }

    /// Hit a ceiling head-on
    pub fn is_ceiling(&self) -> bool {
        self.normal.dot(Vec2::NEG_Y) > 0.5
    }

    /// Touched a side face
    pub fn is_wall(&self) -> bool {
        self.normal.x != 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Interrupt {
    JumpStarted,
    JumpCancelled,
    AnchorToggled,
    GrappleRequested,
    Collision(Collision),
}

impl Interrupt {
    pub fn is_collision(&self) -> bool {
        matches!(self, Interrupt::Collision(_))
    }
}

/// Queries over the interrupts gathered for one frame
pub trait InterruptQuery {
    fn has(&self, interrupt: Interrupt) -> bool;
    fn collision(&self) -> Option<Collision>;
    /// Most recent input (non-collision) interrupt
    fn last_input(&self) -> Option<Interrupt>;
    /// A jump press that was not released or overridden later in the frame
    fn jump_started(&self) -> bool;
    /// Everything except rope toggles, for states nested under a rope
    fn without_anchor(&self) -> Vec<Interrupt>;
}

impl InterruptQuery for [Interrupt] {
    fn has(&self, interrupt: Interrupt) -> bool {
        self.contains(&interrupt)
    }

    fn collision(&self) -> Option<Collision> {
        self.iter().find_map(|i| match i {
            Interrupt::Collision(c) => Some(*c),
            _ => None,
        })
    }

    fn last_input(&self) -> Option<Interrupt> {
        self.iter().rev().find(|i| !i.is_collision()).copied()
    }

    fn jump_started(&self) -> bool {
        self.last_input() == Some(Interrupt::JumpStarted)
    }

    fn without_anchor(&self) -> Vec<Interrupt> {
        self.iter()
            .filter(|i| **i != Interrupt::AnchorToggled)
            .copied()
            .collect()
    }
}
