//! Session control state shared with the host.
//!
//! The frame loop runs on one thread, but the host (a Ctrl-C watcher, a
//! debug console) may pause, resume, slow down, or stop it from another
//! task. All mutable fields are atomics so the loop reads them without
//! locks on the hot path.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use polarise_types::GameOverReason;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::SessionConfig;

/// Largest accepted time scale.
pub const MAX_TIME_SCALE: f32 = 8.0;

/// Reason a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEndReason {
    /// The round ended and auto-restart is off.
    GameOver(GameOverReason),
    /// Reached the configured `max_frames` limit.
    MaxFramesReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// The host asked the loop to stop.
    Stopped,
}

/// Shared session control state.
///
/// Wrapped in [`Arc`](std::sync::Arc) and shared between the frame loop and
/// whatever drives it.
#[derive(Debug)]
pub struct SessionControl {
    /// Whether the loop is paused.
    paused: AtomicBool,

    /// Wakes the loop when resumed.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Simulated-time multiplier, stored as `f32` bits.
    time_scale_bits: AtomicU32,

    /// Real-time pause between frames in milliseconds.
    frame_interval_ms: AtomicU64,

    /// Wall-clock time the session started.
    started_at: DateTime<Utc>,

    /// Maximum frames (0 = unlimited).
    max_frames: u64,

    /// Maximum wall-clock seconds (0 = unlimited).
    max_real_time_seconds: u64,

    /// Why the session ended, once it has.
    end_reason: Mutex<Option<SessionEndReason>>,
}

impl SessionControl {
    /// Create control state from session configuration.
    pub fn new(session: &SessionConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            time_scale_bits: AtomicU32::new(1.0_f32.to_bits()),
            frame_interval_ms: AtomicU64::new(session.frame_interval_ms),
            started_at: Utc::now(),
            max_frames: session.max_frames,
            max_real_time_seconds: session.max_real_time_seconds,
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the loop. It sleeps until resumed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the loop is no longer paused.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) {
            if self.stop_requested.load(Ordering::Acquire) {
                return;
            }
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. Also wakes a paused loop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record why the session ended.
    pub async fn set_end_reason(&self, reason: SessionEndReason) {
        *self.end_reason.lock().await = Some(reason);
    }

    /// Why the session ended, if it has.
    pub async fn end_reason(&self) -> Option<SessionEndReason> {
        *self.end_reason.lock().await
    }

    // -----------------------------------------------------------------------
    // Speed
    // -----------------------------------------------------------------------

    /// Current simulated-time multiplier.
    pub fn time_scale(&self) -> f32 {
        f32::from_bits(self.time_scale_bits.load(Ordering::Acquire))
    }

    /// Set the time multiplier. Must be in `(0, MAX_TIME_SCALE]`.
    ///
    /// Returns the previous scale, or `None` if the value was rejected.
    pub fn set_time_scale(&self, scale: f32) -> Option<f32> {
        if !scale.is_finite() || scale <= 0.0 || scale > MAX_TIME_SCALE {
            return None;
        }
        let prev = self.time_scale_bits.swap(scale.to_bits(), Ordering::AcqRel);
        Some(f32::from_bits(prev))
    }

    /// Real-time pause between frames in milliseconds.
    pub fn frame_interval_ms(&self) -> u64 {
        self.frame_interval_ms.load(Ordering::Acquire)
    }

    /// Change the pause between frames. Returns the previous value.
    pub fn set_frame_interval_ms(&self, ms: u64) -> u64 {
        self.frame_interval_ms.swap(ms, Ordering::AcqRel)
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Whether `frames` has reached a non-zero `max_frames`.
    pub const fn frame_limit_reached(&self, frames: u64) -> bool {
        self.max_frames > 0 && frames >= self.max_frames
    }

    /// Whether a non-zero `max_real_time_seconds` has elapsed.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds since the session started.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Configured frame limit.
    pub const fn max_frames(&self) -> u64 {
        self.max_frames
    }

    /// Configured wall-clock limit.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }
}

/// Serializable session status for logs and the HUD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Frames run so far.
    pub frames: u64,
    /// Rounds started, including the current one.
    pub rounds: u32,
    /// Whether the loop is paused.
    pub paused: bool,
    /// Current time multiplier.
    pub time_scale: f32,
    /// Seconds since start.
    pub elapsed_seconds: u64,
    /// Why the session ended, if it has.
    pub end_reason: Option<SessionEndReason>,
    /// ISO 8601 start time.
    pub started_at: String,
}

impl SessionControl {
    /// Assemble a status view.
    pub async fn status(&self, frames: u64, rounds: u32) -> SessionStatus {
        SessionStatus {
            frames,
            rounds,
            paused: self.is_paused(),
            time_scale: self.time_scale(),
            elapsed_seconds: self.elapsed_seconds(),
            end_reason: self.end_reason().await,
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(max_frames: u64) -> SessionConfig {
        SessionConfig {
            max_frames,
            max_real_time_seconds: 0,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn pause_and_resume() {
        let control = SessionControl::new(&session(0));
        assert!(!control.is_paused());
        control.pause();
        assert!(control.is_paused());
        control.resume();
        assert!(!control.is_paused());
    }

    #[test]
    fn stop_request() {
        let control = SessionControl::new(&session(0));
        assert!(!control.is_stop_requested());
        control.request_stop();
        assert!(control.is_stop_requested());
    }

    #[test]
    fn time_scale_is_validated() {
        let control = SessionControl::new(&session(0));
        assert_eq!(control.set_time_scale(2.0), Some(1.0));
        assert!(control.set_time_scale(0.0).is_none());
        assert!(control.set_time_scale(f32::NAN).is_none());
        assert!(control.set_time_scale(MAX_TIME_SCALE + 1.0).is_none());
        assert!((control.time_scale() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn frame_limit_zero_means_unlimited() {
        let control = SessionControl::new(&session(0));
        assert!(!control.frame_limit_reached(u64::MAX));
        let bounded = SessionControl::new(&session(10));
        assert!(!bounded.frame_limit_reached(9));
        assert!(bounded.frame_limit_reached(10));
    }

    #[test]
    fn time_limit_zero_means_unlimited() {
        let control = SessionControl::new(&session(0));
        assert!(!control.time_limit_reached());
    }

    #[tokio::test]
    async fn stop_wakes_paused_loop() {
        let control = SessionControl::new(&session(0));
        control.pause();
        control.request_stop();
        control.wait_if_paused().await;
        assert!(control.is_paused());
    }

    #[tokio::test]
    async fn status_reports_end_reason() {
        let control = SessionControl::new(&session(0));
        control.set_end_reason(SessionEndReason::Stopped).await;
        let status = control.status(12, 1).await;
        assert_eq!(status.end_reason, Some(SessionEndReason::Stopped));
        assert_eq!(status.frames, 12);
    }
}
