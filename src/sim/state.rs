//! Session state and core simulation types
//!
//! Everything one play session owns lives in `GameState`: the board
//! (physics world plus registry), the dock, pending timers and the event
//! feed. Nothing here is global.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::dock::Dock;
use super::hint::{Hint, HintClock};
use super::physics::{BodyHandle, PhysicsParams, PhysicsWorld};
use super::registry::Board;
use super::timers::TimerQueue;
use crate::catalog::{self, PieceType, TypeId};
use crate::ms_to_ticks;
use crate::settings::{GameMode, Settings};

/// Radius used for a type id outside the catalog
const FALLBACK_RADIUS: f32 = 25.0;

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    Playing,
    /// Dock and board both empty
    Won,
    /// Dock overflowed (or the merge stack reached the danger line)
    Lost,
}

/// Fire-and-forget notifications for HUD, audio and popups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    LevelStarted { level: u32, total_pieces: u32 },
    Spawned { handle: BodyHandle, type_id: TypeId },
    Collected { type_id: TypeId },
    Blocked { handle: BodyHandle, by: BodyHandle },
    DockFull,
    Matched { type_id: TypeId },
    Overflow,
    Shuffled,
    Undone { count: usize },
    Won { level: u32 },
    Lost,
    Merged { from: TypeId, into: TypeId, at: Vec2, score: u64 },
    Dropped { handle: BodyHandle, type_id: TypeId },
    HintShown { handle: BodyHandle, position: Vec2 },
    HintCleared,
}

/// Payload of a deferred timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scheduled {
    /// Staggered level spawn
    SpawnPiece { type_id: TypeId, x: f32 },
    /// Merge-mode drop cooldown elapsed
    DropReady,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    pub board: Board,
    pub dock: Dock,
    pub phase: GamePhase,
    /// Current level (1-based)
    pub level: u32,
    /// Merge-mode score
    pub score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub timers: TimerQueue<Scheduled>,
    pub hint: Option<Hint>,
    pub hint_clock: HintClock,
    /// Undrained notifications
    pub events: Vec<GameEvent>,

    // === Merge mode ===
    /// Tier the next drop will use
    pub next_fruit: TypeId,
    /// Placement ghost while the pointer is down
    pub preview: Option<BodyHandle>,
    /// Drop cooldown active
    pub dropping: bool,
    /// Consecutive ticks with a settled piece above the danger line
    pub danger_ticks: u64,

    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Create an empty session. No level is generated until `start_level`.
    pub fn new(settings: Settings) -> Self {
        let params = PhysicsParams {
            gravity: settings.gravity,
            restitution: settings.restitution,
            friction: settings.friction,
            linear_damping: settings.linear_damping,
            iterations: settings.solver_iterations,
        };
        let mut world = PhysicsWorld::new(params);
        let thickness = settings
            .wall_thickness
            .max(catalog::max_radius(settings.mode));
        world.add_boundaries(settings.width, settings.height, thickness);

        let rng = match settings.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_rng(&mut rand::rng()),
        };

        let hint_clock = HintClock::new(
            ms_to_ticks(settings.hint_idle_ms),
            ms_to_ticks(settings.hint_poll_ms),
        );

        Self {
            board: Board::new(world),
            dock: Dock::new(settings.dock_size),
            phase: GamePhase::Playing,
            level: 1,
            score: 0,
            time_ticks: 0,
            timers: TimerQueue::new(),
            hint: None,
            hint_clock,
            events: Vec::new(),
            next_fruit: 0,
            preview: None,
            dropping: false,
            danger_ticks: 0,
            rng,
            settings,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.settings.mode
    }

    pub fn catalog(&self) -> &'static [PieceType] {
        catalog::catalog_for(self.settings.mode)
    }

    /// Radius for a type in this session's catalog
    pub fn radius_of(&self, type_id: TypeId) -> f32 {
        match self.catalog().get(type_id as usize) {
            Some(t) => t.radius,
            None => {
                log::warn!("Type {type_id} is not in the {} catalog", self.mode().as_str());
                FALLBACK_RADIUS
            }
        }
    }

    /// Pieces still in play: live on the board plus scheduled spawns
    pub fn fruit_count(&self) -> usize {
        self.board.live_count()
            + self
                .timers
                .count_where(|s| matches!(s, Scheduled::SpawnPiece { .. }))
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Drop the current hint and restart the idle clock
    pub fn clear_hint(&mut self) {
        self.hint_clock.reset();
        if self.hint.take().is_some() {
            self.push_event(GameEvent::HintCleared);
        }
    }

    /// Enter Won if the dock and the board are both empty
    pub fn check_won(&mut self) -> bool {
        if self.phase == GamePhase::Playing && self.dock.is_empty() && self.fruit_count() == 0 {
            self.phase = GamePhase::Won;
            log::info!("Level {} cleared", self.level);
            self.push_event(GameEvent::Won { level: self.level });
            return true;
        }
        false
    }

    pub fn lose(&mut self) {
        if self.phase == GamePhase::Playing {
            self.phase = GamePhase::Lost;
            log::info!("Level {} lost", self.level);
            self.push_event(GameEvent::Lost);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty_and_playing() {
        let state = GameState::new(Settings::default());
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.fruit_count(), 0);
        assert!(state.dock.is_empty());
        // Floor and two walls
        assert_eq!(state.board.world().bodies().count(), 3);
    }

    #[test]
    fn test_merge_walls_cover_largest_fruit() {
        let state = GameState::new(Settings::for_mode(GameMode::Merge));
        let wall = state
            .board
            .world()
            .bodies()
            .find_map(|b| match b.shape {
                crate::sim::physics::Shape::Rect { half_extents } if half_extents.y > 500.0 => {
                    Some(half_extents.x * 2.0)
                }
                _ => None,
            })
            .unwrap();
        assert!(wall >= 125.0);
    }

    #[test]
    fn test_fruit_count_includes_scheduled_spawns() {
        let mut state = GameState::new(Settings::default());
        state.board.spawn(0, Vec2::new(100.0, 100.0), 28.0);
        state
            .timers
            .schedule_at(10, Scheduled::SpawnPiece { type_id: 1, x: 50.0 });
        state.timers.schedule_at(10, Scheduled::DropReady);
        assert_eq!(state.fruit_count(), 2);
    }

    #[test]
    fn test_won_requires_empty_dock() {
        let mut state = GameState::new(Settings::default());
        state.dock.insert(3);
        assert!(!state.check_won());
        assert_eq!(state.phase, GamePhase::Playing);

        state.dock.clear();
        assert!(state.check_won());
        assert_eq!(state.events.last(), Some(&GameEvent::Won { level: 1 }));
    }

    #[test]
    fn test_radius_of_unknown_type_falls_back() {
        let state = GameState::new(Settings::default());
        assert_eq!(state.radius_of(0), catalog::DOCK_CATALOG[0].radius);
        assert_eq!(state.radius_of(200), FALLBACK_RADIUS);
    }

    #[test]
    fn test_lose_only_from_playing() {
        let mut state = GameState::new(Settings::default());
        state.phase = GamePhase::Won;
        state.lose();
        assert_eq!(state.phase, GamePhase::Won);
        assert!(state.events.is_empty());
    }
}
