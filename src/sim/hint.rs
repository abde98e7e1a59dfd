//! Idle hints
//!
//! After a stretch with no successful pick the engine nominates a piece,
//! preferring one that would complete a pair already in the dock. Hints are
//! advisory and never change game state.

use glam::Vec2;
use serde::Serialize;

use super::physics::{BodyHandle, BodySnapshot};
use crate::catalog::TypeId;

/// A suggested piece
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hint {
    pub handle: BodyHandle,
    pub type_id: TypeId,
    pub position: Vec2,
}

/// Idle tracking in ticks
#[derive(Debug, Clone)]
pub struct HintClock {
    idle_ticks: u64,
    idle_threshold: u64,
    poll_interval: u64,
}

impl HintClock {
    pub fn new(idle_threshold: u64, poll_interval: u64) -> Self {
        Self {
            idle_ticks: 0,
            idle_threshold,
            poll_interval: poll_interval.max(1),
        }
    }

    /// Player did something useful
    pub fn reset(&mut self) {
        self.idle_ticks = 0;
    }

    pub fn idle_ticks(&self) -> u64 {
        self.idle_ticks
    }

    /// Advance one tick; true when a hint should be recomputed
    pub fn tick(&mut self) -> bool {
        self.idle_ticks += 1;
        self.idle_ticks >= self.idle_threshold
            && (self.idle_ticks - self.idle_threshold) % self.poll_interval == 0
    }
}

/// Choose a hint target.
///
/// 1. A type held exactly twice in the dock, if any live piece has it
/// 2. The most recently docked type
/// 3. Any live piece
pub fn choose_target(dock: &[TypeId], pieces: &[BodySnapshot]) -> Option<Hint> {
    let live = move || pieces.iter().filter(|p| !p.preview);
    let of_type = move |t: TypeId| live().find(|p| p.type_tag == Some(t));

    let pair_type = dock
        .iter()
        .copied()
        .find(|t| dock.iter().filter(|d| *d == t).count() == 2);

    let target = pair_type
        .and_then(&of_type)
        .or_else(|| dock.last().copied().and_then(&of_type))
        .or_else(|| live().next())?;

    Some(Hint {
        handle: target.handle,
        type_id: target.type_tag?,
        position: target.position,
    })
}
