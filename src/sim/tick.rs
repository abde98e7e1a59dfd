//! Fixed timestep simulation tick
//!
//! One tick fires due timers, advances the physics world, then runs the
//! mode-specific bookkeeping (merges and the danger line, or idle hints).

use glam::Vec2;
use rand::Rng;

use super::hint::choose_target;
use super::level::{LevelSpec, MAX_LEVEL, build_pool, spawn_x, spawn_y};
use super::physics::BodyHandle;
use super::state::{GameEvent, GamePhase, GameState, Scheduled};
use crate::ms_to_ticks;
use crate::settings::GameMode;

/// Starting tiers for the first merge-mode drop
const FIRST_DROP_TIERS: u8 = 3;
/// Tiers drawn for every later drop
const NEXT_DROP_TIERS: u8 = 5;
/// Speed under which a piece counts as settled for the danger line (px/s)
const SETTLED_SPEED: f32 = 20.0;

/// Clear the board and dock and start level `level` (clamped to
/// `1..=MAX_LEVEL`).
///
/// All pending timers from the previous level are cancelled first so no
/// stale spawn can land in the new level.
pub fn start_level(state: &mut GameState, level: u32) {
    let level = level.clamp(1, MAX_LEVEL);

    let cancelled = state.timers.cancel_all();
    let cleared = state.board.clear();
    log::debug!("Level reset: {cleared} bodies cleared, {cancelled} timers cancelled");

    state.dock.clear();
    state.phase = GamePhase::Playing;
    state.level = level;
    state.score = 0;
    state.hint = None;
    state.hint_clock.reset();
    state.preview = None;
    state.dropping = false;
    state.danger_ticks = 0;

    match state.mode() {
        GameMode::Dock => {
            let spec = LevelSpec::for_level(level, state.catalog().len());
            let pool = build_pool(&spec, &mut state.rng);
            let interval = ms_to_ticks(state.settings.spawn_interval_ms);
            let now = state.time_ticks;

            for (i, type_id) in pool.into_iter().enumerate() {
                let radius = state.radius_of(type_id);
                let x = spawn_x(
                    &mut state.rng,
                    radius,
                    state.settings.width,
                    state.settings.spawn_margin,
                );
                state
                    .timers
                    .schedule_at(now + i as u64 * interval, Scheduled::SpawnPiece { type_id, x });
            }

            log::info!(
                "Level {}: {} types, {} pieces",
                level,
                spec.fruit_types,
                spec.total_pieces
            );
            state.push_event(GameEvent::LevelStarted {
                level,
                total_pieces: spec.total_pieces,
            });
        }
        GameMode::Merge => {
            state.next_fruit = state.rng.random_range(0..FIRST_DROP_TIERS);
            log::info!("Merge game started");
            state.push_event(GameEvent::LevelStarted {
                level,
                total_pieces: 0,
            });
        }
    }
}

/// Advance the session by one fixed timestep
pub fn tick(state: &mut GameState, dt: f32) {
    // Nothing moves once the game is decided
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;

    for scheduled in state.timers.drain_due(state.time_ticks) {
        fire(state, scheduled);
    }

    state.board.world_mut().step(dt);

    match state.mode() {
        GameMode::Dock => poll_hint(state),
        GameMode::Merge => {
            resolve_merges(state);
            check_danger_line(state);
        }
    }
}

fn fire(state: &mut GameState, scheduled: Scheduled) {
    match scheduled {
        Scheduled::SpawnPiece { type_id, x } => {
            let radius = state.radius_of(type_id);
            let handle = state
                .board
                .spawn(type_id, Vec2::new(x, spawn_y(radius)), radius);
            state.push_event(GameEvent::Spawned { handle, type_id });
        }
        Scheduled::DropReady => {
            state.dropping = false;
            state.next_fruit = state.rng.random_range(0..NEXT_DROP_TIERS);
        }
    }
}

fn poll_hint(state: &mut GameState) {
    if !state.hint_clock.tick() {
        return;
    }

    let pieces = state.board.pieces();
    match choose_target(state.dock.slots(), &pieces) {
        Some(hint) => {
            if state.hint.map(|h| h.handle) != Some(hint.handle) {
                log::debug!("Hint: type {} at {:?}", hint.type_id, hint.position);
                state.push_event(GameEvent::HintShown {
                    handle: hint.handle,
                    position: hint.position,
                });
            }
            state.hint = Some(hint);
        }
        None => {
            if state.hint.take().is_some() {
                state.push_event(GameEvent::HintCleared);
            }
        }
    }
}

/// Fuse touching same-tier pieces into the next tier at their midpoint.
///
/// Each piece takes part in at most one merge per tick; the top tier
/// never merges.
fn resolve_merges(state: &mut GameState) {
    let contacts = state.board.world().contacts().to_vec();
    if contacts.is_empty() {
        return;
    }

    let top_tier = state.catalog().len().saturating_sub(1);
    let mut consumed: Vec<BodyHandle> = Vec::new();

    for (a, b) in contacts {
        if consumed.contains(&a) || consumed.contains(&b) {
            continue;
        }
        let (Ok(ta), Ok(tb)) = (state.board.type_of(a), state.board.type_of(b)) else {
            continue;
        };
        if ta != tb || ta as usize >= top_tier {
            continue;
        }
        let (Some(pa), Some(pb)) = (
            state.board.world().get(a).map(|body| body.pos),
            state.board.world().get(b).map(|body| body.pos),
        ) else {
            continue;
        };

        if let Err(err) = state.board.remove(a).and_then(|_| state.board.remove(b)) {
            log::error!("Merge lost track of a piece: {err}");
            debug_assert!(false, "merge on unregistered piece: {err}");
            continue;
        }
        consumed.extend([a, b]);

        let into = ta + 1;
        let at = (pa + pb) / 2.0;
        let radius = state.radius_of(into);
        let handle = state.board.spawn(into, at, radius);
        let gained = state.catalog()[ta as usize].score;
        state.score += gained;

        log::debug!("Merged tier {ta} into {into}, +{gained}");
        state.push_event(GameEvent::Merged {
            from: ta,
            into,
            at,
            score: gained,
        });
        state.push_event(GameEvent::Spawned {
            handle,
            type_id: into,
        });
    }
}

/// Merge mode loses once a settled piece pokes above the danger line for
/// the whole grace period.
fn check_danger_line(state: &mut GameState) {
    let line = state.settings.danger_line;
    let over = state.board.pieces().iter().any(|p| {
        p.position.y - p.radius < line && p.velocity.length() < SETTLED_SPEED
    });

    if !over {
        state.danger_ticks = 0;
        return;
    }

    state.danger_ticks += 1;
    if state.danger_ticks >= ms_to_ticks(state.settings.danger_grace_ms) {
        log::info!("Stack crossed the danger line, score {}", state.score);
        state.lose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::settings::Settings;

    fn seeded(mode: GameMode) -> GameState {
        let mut settings = Settings::for_mode(mode);
        settings.seed = Some(42);
        GameState::new(settings)
    }

    fn run(state: &mut GameState, ticks: u32) {
        for _ in 0..ticks {
            tick(state, SIM_DT);
        }
    }

    #[test]
    fn test_start_level_schedules_all_pieces() {
        let mut state = seeded(GameMode::Dock);
        start_level(&mut state, 1);

        assert_eq!(state.board.live_count(), 0);
        assert_eq!(state.timers.len(), 27);
        assert_eq!(state.fruit_count(), 27);
        assert_eq!(
            state.events,
            vec![GameEvent::LevelStarted {
                level: 1,
                total_pieces: 27
            }]
        );
    }

    #[test]
    fn test_spawns_are_staggered() {
        let mut state = seeded(GameMode::Dock);
        start_level(&mut state, 1);

        run(&mut state, 1);
        assert_eq!(state.board.live_count(), 1);

        // 50 ms per piece at 120 Hz
        run(&mut state, 6);
        assert_eq!(state.board.live_count(), 2);

        run(&mut state, 6 * 30);
        assert_eq!(state.board.live_count(), 27);
        assert!(state.timers.is_empty());
        assert!(state.board.is_consistent());
    }

    #[test]
    fn test_restart_cancels_pending_spawns() {
        let mut state = seeded(GameMode::Dock);
        start_level(&mut state, 3);
        run(&mut state, 20);
        assert!(state.board.live_count() > 0);

        start_level(&mut state, 1);
        assert_eq!(state.board.live_count(), 0);

        run(&mut state, 6 * 40);
        // Level 1 only, nothing left over from level 3's 45 pieces
        assert_eq!(state.board.live_count(), 27);
    }

    #[test]
    fn test_level_below_one_clamps() {
        let mut state = seeded(GameMode::Dock);
        start_level(&mut state, 0);
        assert_eq!(state.level, 1);
        assert_eq!(state.fruit_count(), 27);
    }

    #[test]
    fn test_level_above_max_clamps() {
        let mut state = seeded(GameMode::Dock);
        start_level(&mut state, u32::MAX);
        assert_eq!(state.level, MAX_LEVEL);
        assert_eq!(state.fruit_count(), ((6 + 3 * MAX_LEVEL) * 3) as usize);
    }

    #[test]
    fn test_pieces_fall_into_view() {
        let mut state = seeded(GameMode::Dock);
        start_level(&mut state, 1);
        run(&mut state, 6 * 27 + 360);

        let height = state.settings.height;
        for p in state.board.pieces() {
            assert!(p.position.y > 0.0 && p.position.y < height, "y = {}", p.position.y);
        }
    }

    #[test]
    fn test_tick_frozen_after_loss() {
        let mut state = seeded(GameMode::Dock);
        start_level(&mut state, 1);
        state.lose();
        let ticks = state.time_ticks;
        run(&mut state, 10);
        assert_eq!(state.time_ticks, ticks);
        assert_eq!(state.board.live_count(), 0);
    }

    #[test]
    fn test_hint_appears_after_idle() {
        let mut state = seeded(GameMode::Dock);
        state.board.spawn(1, Vec2::new(240.0, 770.0), 28.0);

        run(&mut state, 479);
        assert!(state.hint.is_none());
        run(&mut state, 1);
        let hint = state.hint.unwrap();
        assert_eq!(hint.type_id, 1);
        assert!(matches!(state.events.last(), Some(GameEvent::HintShown { .. })));

        state.clear_hint();
        assert!(state.hint.is_none());
        assert_eq!(state.events.last(), Some(&GameEvent::HintCleared));
    }

    #[test]
    fn test_equal_tiers_merge() {
        let mut state = seeded(GameMode::Merge);
        start_level(&mut state, 1);
        let a = state.board.spawn(2, Vec2::new(200.0, 700.0), 30.0);
        let b = state.board.spawn(2, Vec2::new(250.0, 700.0), 30.0);

        run(&mut state, 1);

        assert!(!state.board.world().contains(a));
        assert!(!state.board.world().contains(b));
        assert_eq!(state.board.live_count(), 1);
        assert_eq!(state.board.registry().iter().next().unwrap().1, 3);
        assert_eq!(state.score, 8);
        assert!(state.board.is_consistent());
    }

    #[test]
    fn test_different_tiers_do_not_merge() {
        let mut state = seeded(GameMode::Merge);
        start_level(&mut state, 1);
        state.board.spawn(1, Vec2::new(200.0, 700.0), 22.0);
        state.board.spawn(2, Vec2::new(240.0, 700.0), 30.0);

        run(&mut state, 1);

        assert_eq!(state.board.live_count(), 2);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_top_tier_never_merges() {
        let mut state = seeded(GameMode::Merge);
        start_level(&mut state, 1);
        state.board.spawn(10, Vec2::new(130.0, 600.0), 125.0);
        state.board.spawn(10, Vec2::new(350.0, 600.0), 125.0);

        run(&mut state, 1);

        assert_eq!(state.board.live_count(), 2);
    }

    #[test]
    fn test_dock_mode_never_merges() {
        let mut state = seeded(GameMode::Dock);
        state.board.spawn(2, Vec2::new(200.0, 700.0), 26.0);
        state.board.spawn(2, Vec2::new(240.0, 700.0), 26.0);

        run(&mut state, 1);

        assert_eq!(state.board.live_count(), 2);
    }

    #[test]
    fn test_settled_piece_over_line_loses() {
        let mut settings = Settings::for_mode(GameMode::Merge);
        settings.seed = Some(42);
        settings.gravity = 0.0;
        settings.danger_grace_ms = 100;
        let mut state = GameState::new(settings);
        start_level(&mut state, 1);
        state.board.spawn(0, Vec2::new(240.0, 60.0), 15.0);

        run(&mut state, ms_to_ticks(100) as u32 - 1);
        assert_eq!(state.phase, GamePhase::Playing);
        run(&mut state, 1);
        assert_eq!(state.phase, GamePhase::Lost);
        assert_eq!(state.events.last(), Some(&GameEvent::Lost));
    }

    #[test]
    fn test_falling_piece_over_line_is_safe() {
        let mut state = seeded(GameMode::Merge);
        start_level(&mut state, 1);
        state.settings.danger_grace_ms = 100;
        state.board.spawn(0, Vec2::new(240.0, 50.0), 15.0);
        let handle = state.board.registry().iter().next().unwrap().0;
        state.board.world_mut().apply_impulse(handle, Vec2::new(0.0, 400.0));

        run(&mut state, 240);
        assert_eq!(state.phase, GamePhase::Playing);
    }
}
