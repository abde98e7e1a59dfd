//! The caller-owned engine session
//!
//! Wraps a `GameState` with the frame accumulator that turns variable
//! frame times into fixed simulation ticks, and exposes the input, tool and
//! level operations a host needs. Renderers read snapshots only.

use glam::Vec2;
use serde::Serialize;

use crate::catalog::{self, PieceType, TypeId};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::error::EngineError;
use crate::settings::{GameMode, Settings};
use crate::sim::{
    self, BodySnapshot, GameEvent, GamePhase, GameState, Hint, PickResult, start_level, tick,
};

/// Pointer input from the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up,
}

/// One drawable piece
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PieceView {
    pub position: Vec2,
    pub radius: f32,
    pub type_id: TypeId,
    /// Placement ghost (merge mode)
    pub preview: bool,
}

/// Engine session
pub struct Engine {
    state: GameState,
    accumulator: f32,
}

impl Engine {
    /// Validate settings and start level 1
    pub fn new(settings: Settings) -> Result<Self, EngineError> {
        settings.validate()?;
        log::info!("Engine created in {} mode", settings.mode.as_str());
        let mut engine = Self {
            state: GameState::new(settings),
            accumulator: 0.0,
        };
        engine.start_level(1);
        Ok(engine)
    }

    // === Level control ===

    pub fn start_level(&mut self, level: u32) {
        self.accumulator = 0.0;
        start_level(&mut self.state, level);
    }

    /// Start the current level again
    pub fn restart(&mut self) {
        self.start_level(self.state.level);
    }

    pub fn next_level(&mut self) {
        self.start_level(self.state.level.saturating_add(1));
    }

    /// End the session: cancel pending timers and clear the board
    pub fn shutdown(&mut self) {
        let cancelled = self.state.timers.cancel_all();
        self.state.board.clear();
        self.state.preview = None;
        log::info!("Engine shut down ({cancelled} timers cancelled)");
    }

    // === Frame loop ===

    /// Run as many fixed ticks as `frame_dt` seconds allow.
    ///
    /// Returns the number of ticks run. Long frames are clamped and capped
    /// at `MAX_SUBSTEPS` so a stall can't snowball; a non-finite frame time
    /// counts as zero.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let frame_dt = if frame_dt.is_finite() { frame_dt } else { 0.0 };
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog instead of carrying it into the next frame
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    // === Input ===

    /// Route a pointer event by mode. Dock mode picks on `Down`; merge mode
    /// places, moves and drops the next fruit.
    pub fn pointer(&mut self, event: PointerEvent) -> Option<PickResult> {
        match (self.state.mode(), event) {
            (GameMode::Dock, PointerEvent::Down(at)) => Some(self.pick(at)),
            (GameMode::Dock, _) => None,
            (GameMode::Merge, PointerEvent::Down(at)) => {
                sim::begin_drop(&mut self.state, at);
                None
            }
            (GameMode::Merge, PointerEvent::Move(at)) => {
                sim::move_drop(&mut self.state, at);
                None
            }
            (GameMode::Merge, PointerEvent::Up) => {
                sim::release_drop(&mut self.state);
                None
            }
        }
    }

    pub fn pick(&mut self, at: Vec2) -> PickResult {
        sim::pick(&mut self.state, at)
    }

    pub fn shuffle(&mut self) -> bool {
        sim::shuffle(&mut self.state)
    }

    pub fn undo(&mut self) -> usize {
        sim::undo(&mut self.state)
    }

    // === Snapshots ===

    /// Everything a renderer draws, in stable order
    pub fn pieces(&self) -> Vec<PieceView> {
        self.state
            .board
            .world()
            .query_all()
            .into_iter()
            .filter_map(|s| {
                s.type_tag.map(|type_id| PieceView {
                    position: s.position,
                    radius: s.radius,
                    type_id,
                    preview: s.preview,
                })
            })
            .collect()
    }

    /// Raw physics snapshot of live pieces
    pub fn bodies(&self) -> Vec<BodySnapshot> {
        self.state.board.pieces()
    }

    pub fn dock(&self) -> &[TypeId] {
        self.state.dock.slots()
    }

    pub fn dock_capacity(&self) -> usize {
        self.state.dock.capacity()
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn level(&self) -> u32 {
        self.state.level
    }

    pub fn mode(&self) -> GameMode {
        self.state.mode()
    }

    /// Pieces remaining: on the board or still scheduled to spawn
    pub fn fruit_count(&self) -> usize {
        self.state.fruit_count()
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    /// Current hint, tracking the hinted piece if it has moved
    pub fn hint(&self) -> Option<Hint> {
        let hint = self.state.hint?;
        let body = self.state.board.world().get(hint.handle)?;
        Some(Hint {
            position: body.pos,
            ..hint
        })
    }

    /// Next merge-mode fruit
    pub fn next_fruit(&self) -> Option<&'static PieceType> {
        match self.state.mode() {
            GameMode::Merge => self.piece_type(self.state.next_fruit),
            GameMode::Dock => None,
        }
    }

    /// Catalog entry for a type in this session
    pub fn piece_type(&self, type_id: TypeId) -> Option<&'static PieceType> {
        catalog::piece_type(self.state.mode(), type_id)
    }

    /// Take all notifications raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.state.events)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }
}
