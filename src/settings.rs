//! Movement and collision tuning
//!
//! Stored as JSON next to the level data. Missing fields take their
//! defaults, so a tuning file only needs the values a designer changed.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{ACTOR_HEIGHT, ACTOR_WIDTH};
use crate::sim::collision::CollisionConfig;
use crate::sim::params::MovementParameters;

/// Everything a player controller is built from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Movement ===
    pub movement: MovementParameters,

    // === Collision ===
    pub collision: CollisionConfig,

    // === Actor ===
    /// Bounding box width (world units)
    pub actor_width: f32,
    /// Bounding box height (world units)
    pub actor_height: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            movement: MovementParameters::default(),
            collision: CollisionConfig::default(),
            actor_width: ACTOR_WIDTH,
            actor_height: ACTOR_HEIGHT,
        }
    }
}

impl Tuning {
    pub fn actor_size(&self) -> Vec2 {
        Vec2::new(self.actor_width, self.actor_height)
    }

    /// Parse, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut tuning: Self = serde_json::from_str(json)?;
        if !tuning.movement.is_valid() {
            log::warn!("Movement tuning cannot produce finite motion; using default movement");
            tuning.movement = MovementParameters::default();
        }
        if !(tuning.actor_width > 0.0 && tuning.actor_height > 0.0) {
            log::warn!(
                "Invalid actor size {}x{}; using default",
                tuning.actor_width,
                tuning.actor_height
            );
            tuning.actor_width = ACTOR_WIDTH;
            tuning.actor_height = ACTOR_HEIGHT;
        }
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from `path`, falling back to defaults if it is missing or broken
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    return tuning;
                }
                Err(e) => log::warn!("Ignoring malformed tuning {}: {e}", path.display()),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Could not read tuning {}: {e}", path.display()),
        }

        log::info!("Using default tuning");
        Self::default()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Tuning saved to {}", path.display());
        Ok(())
    }
}
