//! Player operations: picking, tools and merge-mode dropping
//!
//! Every operation runs to completion against the current snapshot; there
//! is never more than one in flight.

use glam::Vec2;
use rand::Rng;

use super::dock::MatchOutcome;
use super::level::{spawn_x, spawn_y};
use super::physics::BodyDesc;
use super::pick::{PickResult, find_blocker, find_candidate};
use super::state::{GameEvent, GamePhase, GameState, Scheduled};
use crate::consts::UNDO_BATCH;
use crate::ms_to_ticks;
use crate::settings::GameMode;

/// Keep drops this far from the walls (px)
const DROP_MARGIN: f32 = 20.0;
/// Vertical gap between pieces returned by one undo (px)
const UNDO_STAGGER_GAP: f32 = 10.0;

/// Try to collect the piece nearest `at`
pub fn pick(state: &mut GameState, at: Vec2) -> PickResult {
    if state.mode() != GameMode::Dock || state.phase != GamePhase::Playing {
        return PickResult::Miss;
    }

    let pieces = state.board.pieces();
    let Some(candidate) = find_candidate(&pieces, at, state.settings.pick_radius_sq).copied() else {
        return PickResult::Miss;
    };

    let settings = &state.settings;
    if let Some(blocker) = find_blocker(
        &candidate,
        &pieces,
        settings.obstruction_dx,
        settings.obstruction_dy,
    ) {
        let kick = state.rng.random_range(-1.0f32..=1.0) * settings.shake_impulse;
        state
            .board
            .world_mut()
            .apply_impulse(candidate.handle, Vec2::new(kick, 0.0));
        state.push_event(GameEvent::Blocked {
            handle: candidate.handle,
            by: blocker,
        });
        return PickResult::Blocked;
    }

    if !state.dock.has_room() {
        state.push_event(GameEvent::DockFull);
        return PickResult::DockFull;
    }

    let type_id = match state.board.remove(candidate.handle) {
        Ok(type_id) => type_id,
        Err(err) => {
            log::error!("Pick on a piece the registry doesn't know: {err}");
            debug_assert!(false, "stale pick candidate: {err}");
            return PickResult::Miss;
        }
    };

    state.push_event(GameEvent::Collected { type_id });
    state.clear_hint();

    match state.dock.insert(type_id) {
        MatchOutcome::Matched(matched) => {
            log::debug!("Matched three of type {matched}");
            state.push_event(GameEvent::Matched { type_id: matched });
            state.check_won();
        }
        MatchOutcome::Overflow => {
            log::info!("Dock overflow: {:?}", state.dock.slots());
            state.push_event(GameEvent::Overflow);
            state.lose();
        }
        MatchOutcome::NoMatch => {}
    }

    PickResult::Collected(type_id)
}

/// Kick every piece randomly to loosen a jammed pile. Returns false when
/// the game is not in play.
pub fn shuffle(state: &mut GameState) -> bool {
    if state.phase != GamePhase::Playing {
        return false;
    }

    let strength = state.settings.shuffle_impulse;
    let handles: Vec<_> = state.board.registry().iter().map(|(h, _)| h).collect();
    for handle in handles {
        let kick = Vec2::new(
            state.rng.random_range(-1.0f32..=1.0) * strength,
            -state.rng.random_range(0.0f32..=1.0) * strength,
        );
        state.board.world_mut().apply_impulse(handle, kick);
    }

    state.push_event(GameEvent::Shuffled);
    state.clear_hint();
    true
}

/// Return the last (up to three) dock entries to the board, newest first.
///
/// Pops by position, not by collection: the three most recent slots come
/// back whatever their types. Returns how many pieces were re-spawned.
pub fn undo(state: &mut GameState) -> usize {
    if state.mode() != GameMode::Dock
        || state.phase != GamePhase::Playing
        || state.dock.is_empty()
    {
        return 0;
    }

    let popped = state.dock.pop_last(UNDO_BATCH);
    let mut y_offset = 0.0;
    for type_id in &popped {
        let radius = state.radius_of(*type_id);
        let x = spawn_x(
            &mut state.rng,
            radius,
            state.settings.width,
            state.settings.spawn_margin,
        );
        let pos = Vec2::new(x, spawn_y(radius) - y_offset);
        y_offset += radius * 2.0 + UNDO_STAGGER_GAP;

        let handle = state.board.spawn(*type_id, pos, radius);
        state.push_event(GameEvent::Spawned {
            handle,
            type_id: *type_id,
        });
    }

    log::debug!("Undo returned {:?} to the board", popped);
    state.push_event(GameEvent::Undone {
        count: popped.len(),
    });
    state.clear_hint();
    popped.len()
}

/// Merge mode: show the placement ghost under the pointer
pub fn begin_drop(state: &mut GameState, at: Vec2) {
    if state.mode() != GameMode::Merge
        || state.phase != GamePhase::Playing
        || state.dropping
        || state.preview.is_some()
    {
        return;
    }

    let type_id = state.next_fruit;
    let radius = state.radius_of(type_id);
    let pos = Vec2::new(drop_x(state, at.x, radius), state.settings.drop_height);
    let handle = state
        .board
        .spawn_with(BodyDesc::preview(pos, radius, type_id));
    state.preview = Some(handle);
}

/// Merge mode: follow the pointer horizontally
pub fn move_drop(state: &mut GameState, at: Vec2) {
    let Some(handle) = state.preview else {
        return;
    };
    if state.dropping {
        return;
    }
    let radius = state.radius_of(state.next_fruit);
    let pos = Vec2::new(drop_x(state, at.x, radius), state.settings.drop_height);
    state.board.world_mut().set_position(handle, pos);
}

/// Merge mode: replace the ghost with a real piece and start the cooldown
pub fn release_drop(state: &mut GameState) {
    let Some(ghost) = state.preview.take() else {
        return;
    };
    let Some(pos) = state.board.world().get(ghost).map(|b| b.pos) else {
        return;
    };
    state.board.remove_preview(ghost);

    if state.phase != GamePhase::Playing {
        return;
    }

    let type_id = state.next_fruit;
    let radius = state.radius_of(type_id);
    let handle = state.board.spawn(type_id, pos, radius);
    state.dropping = true;
    let due = state.time_ticks + ms_to_ticks(state.settings.drop_cooldown_ms);
    state.timers.schedule_at(due, Scheduled::DropReady);

    state.push_event(GameEvent::Dropped { handle, type_id });
}

/// Clamp a drop to stay clear of both walls
fn drop_x(state: &GameState, x: f32, radius: f32) -> f32 {
    let lo = radius + DROP_MARGIN;
    let hi = state.settings.width - radius - DROP_MARGIN;
    x.min(hi).max(lo)
}
