//! Session loop runner with host controls.
//!
//! [`run_session`] drives the [`SystemCoordinator`] one frame at a time with
//! support for:
//!
//! - **Bounded sessions**: stop after `max_frames` or `max_real_time_seconds`
//! - **Pause/resume** and a runtime time scale through [`SessionControl`]
//! - **Game over**: end the session, or restart the round when
//!   `auto_restart` is set
//! - **Async handlers**: pending bus handlers are flushed after every frame

use std::sync::Arc;

use polarise_types::{GameOverReason, GameStateSnapshot};
use tracing::{debug, info, warn};

use crate::clock::FrameTick;
use crate::config::SessionConfig;
use crate::control::{SessionControl, SessionEndReason};
use crate::coordinator::SystemCoordinator;
use crate::game_state::SharedGameState;

/// Errors that can occur during a session.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configured frame delta is unusable.
    #[error("invalid frame_dt: {frame_dt}")]
    InvalidFrameDt {
        /// The rejected value.
        frame_dt: f32,
    },

    /// The game state was still borrowed when the runner read it.
    #[error("game state is busy: {source}")]
    StateBusy {
        /// The underlying borrow error.
        #[from]
        source: std::cell::BorrowError,
    },
}

/// Result of a session.
#[derive(Debug, Clone)]
pub struct SessionResult {
    /// Why the session ended.
    pub end_reason: SessionEndReason,
    /// Frames executed.
    pub frames: u64,
    /// Rounds played, including the last one.
    pub rounds: u32,
    /// Game state after the last frame, if any frame ran.
    pub final_snapshot: Option<GameStateSnapshot>,
}

/// Callback invoked after each frame.
pub trait FrameCallback {
    /// Called after a frame completes and async handlers have run.
    fn on_frame(&mut self, tick: &FrameTick, snapshot: &GameStateSnapshot);
}

/// A callback that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl FrameCallback for NoOpCallback {
    fn on_frame(&mut self, _tick: &FrameTick, _snapshot: &GameStateSnapshot) {}
}

/// Run frames until the game ends, a limit is reached, or a stop is
/// requested.
///
/// # Errors
///
/// Returns [`RunnerError::InvalidFrameDt`] for a non-positive frame delta
/// and [`RunnerError::StateBusy`] if the game state is borrowed elsewhere
/// between frames.
pub async fn run_session(
    coordinator: &mut SystemCoordinator,
    game_state: &SharedGameState,
    session: &SessionConfig,
    control: &Arc<SessionControl>,
    callback: &mut dyn FrameCallback,
) -> Result<SessionResult, RunnerError> {
    if !session.frame_dt.is_finite() || session.frame_dt <= 0.0 {
        return Err(RunnerError::InvalidFrameDt {
            frame_dt: session.frame_dt,
        });
    }

    let mut frames: u64 = 0;
    let mut rounds: u32 = 1;
    let mut last_snapshot: Option<GameStateSnapshot> = None;

    info!(
        max_frames = control.max_frames(),
        max_real_time_seconds = control.max_real_time_seconds(),
        frame_dt = session.frame_dt,
        auto_restart = session.auto_restart,
        "Session starting"
    );

    let end_reason = loop {
        // --- Check pause ---
        if control.is_paused() {
            info!("Session paused, waiting for resume...");
            control.wait_if_paused().await;
            info!("Session resumed");
        }

        // --- Check stop / time limit (before frame) ---
        if control.is_stop_requested() {
            info!("Stop requested");
            break SessionEndReason::Stopped;
        }
        if control.time_limit_reached() {
            info!(
                max_seconds = control.max_real_time_seconds(),
                elapsed = control.elapsed_seconds(),
                "Real-time limit reached"
            );
            break SessionEndReason::MaxRealTimeReached;
        }

        // --- Execute frame ---
        let tick = coordinator.update(session.frame_dt * control.time_scale());
        frames = frames.saturating_add(1);
        let flushed = coordinator.bus().flush_pending().await;
        if flushed > 0 {
            debug!(frame = tick.frame, flushed, "async handlers flushed");
        }

        let snapshot = game_state.try_borrow()?.full_state();
        callback.on_frame(&tick, &snapshot);
        last_snapshot = Some(snapshot);

        // --- Check game over ---
        if let Some(reason) = snapshot.game_over_reason.filter(|_| snapshot.is_game_over) {
            if !session.auto_restart {
                break SessionEndReason::GameOver(reason);
            }
            info!(
                round = rounds,
                reason = reason.code(),
                score = snapshot.score,
                "Round over, restarting"
            );
            coordinator.restart();
            coordinator.bus().flush_pending().await;
            rounds = rounds.saturating_add(1);
        }

        // --- Check frame limit (after frame) ---
        if control.frame_limit_reached(frames) {
            info!(frames, max_frames = control.max_frames(), "Frame limit reached");
            break SessionEndReason::MaxFramesReached;
        }

        // --- Pace ---
        let interval_ms = control.frame_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    };

    control.set_end_reason(end_reason).await;
    Ok(SessionResult {
        end_reason,
        frames,
        rounds,
        final_snapshot: last_snapshot,
    })
}

/// Log the end of a session.
pub fn log_session_end(result: &SessionResult) {
    info!(
        reason = ?result.end_reason,
        frames = result.frames,
        rounds = result.rounds,
        "Session ended"
    );
    if let Some(snapshot) = &result.final_snapshot {
        info!(
            outrage = snapshot.outrage,
            energy = snapshot.energy,
            game_time = snapshot.game_time,
            polarised_people = snapshot.polarised_people,
            score = snapshot.score,
            reason = snapshot.game_over_reason.map(GameOverReason::code),
            "Final state"
        );
    } else {
        warn!("Session ended with no frames executed");
    }
}
