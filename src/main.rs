//! Slingshot headless runner
//!
//! Drives the game with seeded demo input and prints the final frame as
//! JSON. Usage: `slingshot [settings.json] [levels.json]`.
//! Seed comes from `SLINGSHOT_SEED` (default 1).

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Slingshot (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The core is driven by the host page on the web
}

/// Upper bound on simulated frames (10 minutes at 60 Hz)
#[cfg(not(target_arch = "wasm32"))]
const MAX_FRAMES: u32 = 60 * 60 * 10;

#[cfg(not(target_arch = "wasm32"))]
fn run() -> slingshot::Result<()> {
    use slingshot::sim::{Autoplayer, GameEvent};
    use slingshot::{LevelRegistry, Session, Settings};

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let levels = match args.next() {
        Some(path) => LevelRegistry::load(path)?,
        None => LevelRegistry::builtin(),
    };
    let seed = std::env::var("SLINGSHOT_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    log::info!("Autoplay seed {seed}");

    let frame_dt = settings.sim_dt;
    let mut session = Session::new(settings, levels)?;
    let mut input = Autoplayer::new(seed);

    let mut frames = 0;
    while !session.game_over() && frames < MAX_FRAMES {
        input.act(&mut session)?;
        session.advance_frame(frame_dt)?;
        for event in session.drain_events() {
            match event {
                GameEvent::LevelCleared { level, score } | GameEvent::LevelFailed { level, score } => {
                    log::debug!("Level {} finished with {score}", level + 1)
                }
                _ => log::trace!("{event:?}"),
            }
        }
        frames += 1;
    }

    if !session.game_over() {
        log::warn!("Stopped after {frames} frames without finishing");
    }
    for result in session.results() {
        log::info!(
            "Level {}: {} points, {} birds, {}",
            result.level + 1,
            result.score,
            result.birds_used,
            if result.cleared { "cleared" } else { "failed" }
        );
    }

    let json = serde_json::to_string_pretty(&session.frame()).map_err(slingshot::settings::ConfigError::from)?;
    println!("{json}");
    Ok(())
}
