//! Headless engine binary for the Polarise simulation.
//!
//! Wires the event bus, service registry, game state, player, NPC flocking
//! engine, and police into a coordinator and runs a session with an
//! autopilot standing in for the keyboard.
//!
//! # Startup Sequence
//!
//! 1. Parse command-line arguments
//! 2. Load configuration from `polarise-config.yaml`
//! 3. Initialize structured logging (tracing)
//! 4. Wire every service and initialize the systems
//! 5. Install the Ctrl-C stop watcher
//! 6. Run the session loop
//! 7. Log the result

mod autopilot;
mod error;
mod hud;
mod wiring;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use clap::Parser;
use polarise_core::config::GameConfig;
use polarise_core::control::SessionControl;
use polarise_core::input::{IdleInput, SharedInput};
use polarise_core::runner;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::autopilot::AutopilotInput;
use crate::error::EngineError;
use crate::hud::HudCallback;

/// Headless Polarise session runner.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file; defaults apply when it does not exist.
    #[arg(short, long, value_name = "PATH", default_value = "polarise-config.yaml")]
    config: PathBuf,

    /// World seed, overriding the config file and `POLARISE_SEED`.
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many frames (0 = unlimited).
    #[arg(long, value_name = "FRAMES")]
    max_frames: Option<u64>,

    /// Start a new round after game over.
    #[arg(long)]
    auto_restart: bool,

    /// Leave the player standing still instead of running the autopilot.
    #[arg(long)]
    idle: bool,

    /// Emit JSON log lines.
    #[arg(long)]
    json: bool,
}

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, wiring, or the session loop fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1-2. Arguments and configuration.
    let args = Args::parse();
    let config = load_config(&args)?;

    // 3. Initialize structured logging.
    init_logging(&config, args.json)?;
    info!(
        config = %args.config.display(),
        seed = config.session.seed,
        max_frames = config.session.max_frames,
        frame_dt = config.session.frame_dt,
        "polarise-engine starting"
    );

    // 4. Wire services and systems.
    let input: SharedInput = if args.idle {
        Rc::new(RefCell::new(IdleInput::new()))
    } else {
        Rc::new(RefCell::new(AutopilotInput::new(config.session.seed)))
    };
    let mut world = wiring::build_world(&config, input)?;

    // 5. Ctrl-C requests a clean stop at the next frame boundary.
    let control = Arc::new(SessionControl::new(&config.session));
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping session");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }

    // 6. Run the session.
    let mut hud = HudCallback::new(
        config.logging.hud_interval_frames,
        args.json || config.logging.json,
    )
        .with_police(Rc::clone(&world.police))
        .with_npcs(Rc::clone(&world.npcs));
    let result = runner::run_session(
        &mut world.coordinator,
        &world.state,
        &config.session,
        &control,
        &mut hud,
    )
    .await
    .map_err(EngineError::from)?;

    // 7. Log results.
    world.coordinator.shutdown();
    runner::log_session_end(&result);
    info!(
        end_reason = ?result.end_reason,
        frames = result.frames,
        background = world.scene.background(),
        "polarise-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration and apply environment and command-line overrides.
fn load_config(args: &Args) -> Result<GameConfig, EngineError> {
    let mut config = read_config_file(&args.config)?;
    config.session.apply_env_overrides();
    if let Some(seed) = args.seed {
        config.session.seed = seed;
    }
    if let Some(max_frames) = args.max_frames {
        config.session.max_frames = max_frames;
    }
    if args.auto_restart {
        config.session.auto_restart = true;
    }
    config.validate()?;
    Ok(config)
}

/// Read `path`, or fall back to defaults when it does not exist.
fn read_config_file(path: &Path) -> Result<GameConfig, EngineError> {
    if path.exists() {
        Ok(GameConfig::from_file(path)?)
    } else {
        Ok(GameConfig::default())
    }
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over `logging.level` when set.
fn init_logging(config: &GameConfig, json: bool) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if json || config.logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}
