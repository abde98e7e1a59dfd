//! Fruit Dock - a physics puzzle engine
//!
//! Core modules:
//! - `sim`: Simulation (physics world, piece registry, dock, level generation)
//! - `engine`: Caller-owned session object driving the fixed-step loop
//! - `settings`: Data-driven engine configuration
//! - `catalog`: Static piece type tables

pub mod catalog;
pub mod engine;
pub mod error;
pub mod settings;
pub mod sim;

pub use catalog::PieceType;
pub use engine::Engine;
pub use error::EngineError;
pub use settings::{GameMode, Settings};

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for stable stacking)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the accumulator will accept (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Reference dock capacity
    pub const DOCK_SIZE: usize = 7;
    /// Pieces cleared by one match
    pub const MATCH_COUNT: usize = 3;
    /// Dock entries returned to the board by one undo
    pub const UNDO_BATCH: usize = 3;

    /// Squared pick radius (≈ 60 px)
    pub const PICK_RADIUS_SQ: f32 = 3600.0;

    /// Below this approach speed collisions don't bounce (px/s)
    pub const RESTING_SPEED: f32 = 40.0;
}

/// Convert a duration in milliseconds to a whole number of simulation ticks.
///
/// Rounds up so that a timer never fires early; anything positive is at
/// least one tick.
#[inline]
pub fn ms_to_ticks(ms: u32) -> u64 {
    if ms == 0 {
        return 0;
    }
    let ticks = (ms as f64 / 1000.0 / consts::SIM_DT as f64).ceil() as u64;
    ticks.max(1)
}

/// Convert simulation ticks back to milliseconds
#[inline]
pub fn ticks_to_ms(ticks: u64) -> f64 {
    ticks as f64 * consts::SIM_DT as f64 * 1000.0
}
