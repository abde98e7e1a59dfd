//! Simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only
//! - Stable iteration order (by body handle)
//! - No rendering or platform dependencies

pub mod actions;
pub mod collision;
pub mod dock;
pub mod hint;
pub mod level;
pub mod physics;
pub mod pick;
pub mod registry;
pub mod state;
pub mod tick;
pub mod timers;

pub use actions::{begin_drop, move_drop, pick, release_drop, shuffle, undo};
pub use collision::{CollisionResult, circle_circle, circle_rect};
pub use dock::{Dock, MatchOutcome};
pub use hint::{Hint, HintClock, choose_target};
pub use level::{LevelSpec, build_pool};
pub use physics::{BodyDesc, BodyHandle, BodyKind, BodySnapshot, PhysicsParams, PhysicsWorld, Shape};
pub use pick::PickResult;
pub use registry::{Board, PieceRegistry};
pub use state::{GameEvent, GamePhase, GameState, Scheduled};
pub use tick::{start_level, tick};
pub use timers::{TimerId, TimerQueue};
