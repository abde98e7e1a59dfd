//! Engine settings
//!
//! Loaded from JSON; any field left out falls back to the reference value.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{DOCK_SIZE, MATCH_COUNT, PICK_RADIUS_SQ};
use crate::error::EngineError;

/// Which game mechanic a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Tap pieces into the dock, three of a kind clear
    #[default]
    Dock,
    /// Drop fruit, equal tiers fuse on contact for score
    Merge,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Dock => "Dock",
            GameMode::Merge => "Merge",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dock" | "triple" => Some(GameMode::Dock),
            "merge" => Some(GameMode::Merge),
            _ => None,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: GameMode,

    // === Arena ===
    pub width: f32,
    pub height: f32,
    /// Boundary thickness, must cover the largest piece radius
    pub wall_thickness: f32,

    // === Physics ===
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    pub restitution: f32,
    pub friction: f32,
    /// Velocity decay per second
    pub linear_damping: f32,
    pub solver_iterations: u32,

    // === Dock & picking ===
    pub dock_size: usize,
    pub pick_radius_sq: f32,
    /// Horizontal reach of the obstruction box
    pub obstruction_dx: f32,
    /// Vertical reach of the obstruction box (above the candidate)
    pub obstruction_dy: f32,
    /// Horizontal kick for a blocked pick (px/s)
    pub shake_impulse: f32,
    /// Maximum kick applied by shuffle (px/s)
    pub shuffle_impulse: f32,

    // === Spawning ===
    pub spawn_interval_ms: u32,
    pub spawn_margin: f32,

    // === Hints ===
    pub hint_idle_ms: u32,
    pub hint_poll_ms: u32,

    // === Merge mode ===
    pub drop_height: f32,
    pub drop_cooldown_ms: u32,
    pub danger_line: f32,
    pub danger_grace_ms: u32,

    /// Fixed RNG seed; entropy when absent
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: GameMode::Dock,

            width: 480.0,
            height: 800.0,
            wall_thickness: 60.0,

            gravity: 980.0,
            restitution: 0.3,
            friction: 0.1,
            linear_damping: 0.6,
            solver_iterations: 6,

            dock_size: DOCK_SIZE,
            pick_radius_sq: PICK_RADIUS_SQ,
            obstruction_dx: 40.0,
            obstruction_dy: 70.0,
            shake_impulse: 120.0,
            shuffle_impulse: 300.0,

            spawn_interval_ms: 50,
            spawn_margin: 20.0,

            hint_idle_ms: 4000,
            hint_poll_ms: 1000,

            drop_height: 50.0,
            drop_cooldown_ms: 500,
            danger_line: 100.0,
            danger_grace_ms: 2000,

            seed: None,
        }
    }
}

impl Settings {
    /// Create settings for a mode with reference values for everything else
    pub fn for_mode(mode: GameMode) -> Self {
        let mut settings = Self::default();
        settings.mode = mode;
        settings
    }

    /// Parse settings from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations that cannot produce a playable session
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: &str| Err(EngineError::InvalidSettings(msg.to_string()));

        if !(self.width > 0.0 && self.height > 0.0) {
            return invalid("arena must have positive width and height");
        }
        if self.wall_thickness <= 0.0 {
            return invalid("wall_thickness must be positive");
        }
        if self.dock_size < MATCH_COUNT {
            return invalid("dock_size must hold at least one match");
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return invalid("restitution must be within 0..=1");
        }
        if self.friction < 0.0 || self.linear_damping < 0.0 {
            return invalid("friction and damping must not be negative");
        }
        if self.solver_iterations == 0 {
            return invalid("solver_iterations must be at least 1");
        }
        if self.pick_radius_sq <= 0.0 {
            return invalid("pick_radius_sq must be positive");
        }
        if self.hint_poll_ms == 0 {
            return invalid("hint_poll_ms must be positive");
        }
        Ok(())
    }
}
