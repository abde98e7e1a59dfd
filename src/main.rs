//! Fruit Dock headless driver
//!
//! Runs the engine without a renderer and plays it automatically, logging
//! the event feed. Useful for soak-testing the physics and level flow.
//!
//! Usage: `fruit-dock [dock|merge] [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = args
        .first()
        .and_then(|s| fruit_dock::GameMode::from_str(s))
        .unwrap_or_default();

    let mut settings = match args.get(1) {
        Some(path) => match fruit_dock::Settings::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("Could not load {path}: {err}");
                std::process::exit(1);
            }
        },
        None => fruit_dock::Settings::default(),
    };
    settings.mode = mode;

    match fruit_dock::Engine::new(settings) {
        Ok(engine) => autoplay::run(engine),
        Err(err) => {
            log::error!("Could not start engine: {err}");
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The engine is embedded by a host page; there is no standalone entry
}

#[cfg(not(target_arch = "wasm32"))]
mod autoplay {
    use fruit_dock::engine::PointerEvent;
    use fruit_dock::sim::{GameEvent, GamePhase};
    use fruit_dock::{Engine, GameMode};
    use glam::Vec2;

    /// Simulated display rate
    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Give up after this many frames (10 minutes of play)
    const MAX_FRAMES: u32 = 60 * 600;
    /// Frames between automatic moves
    const MOVE_EVERY: u32 = 20;
    /// Levels to attempt in dock mode
    const LAST_LEVEL: u32 = 3;
    /// Shuffle after this many blocked picks in a row
    const SHUFFLE_AFTER_BLOCKS: u32 = 5;

    pub fn run(mut engine: Engine) {
        log::info!("Fruit Dock (headless) starting in {} mode", engine.mode().as_str());

        let mut blocked_in_row = 0;
        let mut drop_x = 60.0;

        for frame in 0..MAX_FRAMES {
            engine.advance(FRAME_DT);

            for event in engine.drain_events() {
                report(&event);
            }

            match engine.phase() {
                GamePhase::Won if engine.level() < LAST_LEVEL => {
                    engine.next_level();
                    continue;
                }
                GamePhase::Won | GamePhase::Lost => break,
                GamePhase::Playing => {}
            }

            if frame % MOVE_EVERY != 0 {
                continue;
            }

            match engine.mode() {
                GameMode::Dock => {
                    let Some(target) = choose_pick(&engine) else {
                        continue;
                    };
                    match engine.pick(target) {
                        fruit_dock::sim::PickResult::Blocked => blocked_in_row += 1,
                        _ => blocked_in_row = 0,
                    }
                    if blocked_in_row >= SHUFFLE_AFTER_BLOCKS {
                        engine.shuffle();
                        blocked_in_row = 0;
                    }
                }
                GameMode::Merge => {
                    engine.pointer(PointerEvent::Down(Vec2::new(drop_x, 0.0)));
                    engine.pointer(PointerEvent::Up);
                    drop_x = if drop_x > 400.0 { 60.0 } else { drop_x + 70.0 };
                }
            }
        }

        println!(
            "Finished: {:?} on level {} after {:.1}s (dock {:?}, {} pieces left, score {})",
            engine.phase(),
            engine.level(),
            fruit_dock::ticks_to_ms(engine.state().time_ticks) / 1000.0,
            engine.dock(),
            engine.fruit_count(),
            engine.score()
        );
    }

    /// Follow the hint when there is one, otherwise take the highest piece
    fn choose_pick(engine: &Engine) -> Option<Vec2> {
        if let Some(hint) = engine.hint() {
            return Some(hint.position);
        }
        engine
            .bodies()
            .into_iter()
            .min_by(|a, b| a.position.y.total_cmp(&b.position.y))
            .map(|b| b.position)
    }

    fn report(event: &GameEvent) {
        match event {
            GameEvent::Spawned { .. } | GameEvent::HintShown { .. } | GameEvent::HintCleared => {
                log::trace!("{event:?}")
            }
            GameEvent::Won { .. } | GameEvent::Lost | GameEvent::LevelStarted { .. } => {
                log::info!("{event:?}")
            }
            _ => log::debug!("{event:?}"),
        }
    }
}
