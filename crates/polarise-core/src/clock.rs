//! Frame clock with two scheduling lanes.
//!
//! Every frame has a variable-length **render** lane (movement, collision,
//! meters) and zero or more fixed-length **simulation** steps (flocking
//! logic, state machines, crowd detection). The clock converts the host's
//! frame delta into both, so systems never keep their own throttling
//! accumulators.
//!
//! # Design Principles
//!
//! - Frame deltas are clamped to `[0, max_frame_dt]`; a stalled host cannot
//!   produce a runaway catch-up.
//! - At most `max_steps_per_frame` simulation steps run per frame. Backlog
//!   beyond that is dropped, not carried.

use tracing::debug;

use crate::config::TimingConfig;

/// Errors raised by invalid clock configuration.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Invalid timing configuration.
    #[error("invalid timing configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Timing information handed to every system for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Frame number, starting at 1 for the first frame.
    pub frame: u64,
    /// Render-lane delta in seconds (clamped).
    pub render_dt: f32,
    /// Length of one simulation step in seconds.
    pub sim_dt: f32,
    /// Simulation steps to run this frame.
    pub sim_steps: u32,
    /// Total clamped time since the clock started or was reset.
    pub elapsed: f64,
}

impl FrameTick {
    /// A tick with a render delta and no simulation steps.
    pub const fn render_only(frame: u64, render_dt: f32, sim_dt: f32) -> Self {
        Self {
            frame,
            render_dt,
            sim_dt,
            sim_steps: 0,
            elapsed: 0.0,
        }
    }
}

/// Fixed-step accumulator clock.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    sim_dt: f32,
    max_steps: u32,
    max_frame_dt: f32,
    accumulator: f32,
    frame: u64,
    elapsed: f64,
}

impl FrameClock {
    /// Create a clock from timing configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] for a `logic_hz` or
    /// `max_frame_dt` that is not finite and positive, or zero
    /// `max_steps_per_frame`.
    pub fn new(config: &TimingConfig) -> Result<Self, ClockError> {
        if !config.logic_hz.is_finite() || config.logic_hz <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("logic_hz must be finite and positive, got {}", config.logic_hz),
            });
        }
        if !config.max_frame_dt.is_finite() || config.max_frame_dt <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!(
                    "max_frame_dt must be finite and positive, got {}",
                    config.max_frame_dt
                ),
            });
        }
        if config.max_steps_per_frame == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "max_steps_per_frame must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            sim_dt: 1.0 / config.logic_hz,
            max_steps: config.max_steps_per_frame,
            max_frame_dt: config.max_frame_dt,
            accumulator: 0.0,
            frame: 0,
            elapsed: 0.0,
        })
    }

    /// Advance by one host frame of `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> FrameTick {
        let render_dt = if dt.is_finite() {
            dt.clamp(0.0, self.max_frame_dt)
        } else {
            0.0
        };
        self.frame = self.frame.saturating_add(1);
        self.elapsed += f64::from(render_dt);
        self.accumulator += render_dt;

        let mut sim_steps = 0_u32;
        while self.accumulator >= self.sim_dt && sim_steps < self.max_steps {
            self.accumulator -= self.sim_dt;
            sim_steps = sim_steps.saturating_add(1);
        }
        if self.accumulator >= self.sim_dt {
            debug!(
                frame = self.frame,
                dropped = self.accumulator,
                "simulation backlog dropped"
            );
            self.accumulator %= self.sim_dt;
        }

        FrameTick {
            frame: self.frame,
            render_dt,
            sim_dt: self.sim_dt,
            sim_steps,
            elapsed: self.elapsed,
        }
    }

    /// Length of one simulation step.
    pub const fn sim_dt(&self) -> f32 {
        self.sim_dt
    }

    /// Frames advanced since start or reset.
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Clamped seconds since start or reset.
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Return to frame zero with an empty accumulator.
    pub const fn reset(&mut self) {
        self.accumulator = 0.0;
        self.frame = 0;
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn clock() -> FrameClock {
        FrameClock::new(&TimingConfig::default()).unwrap()
    }

    #[test]
    fn sixty_frames_yield_ten_steps() {
        let mut clock = clock();
        let steps: u32 = (0..60).map(|_| clock.advance(1.0 / 60.0).sim_steps).sum();
        // Float accumulation may leave the last step a hair short.
        assert!((9..=10).contains(&steps), "steps = {steps}");
        assert_eq!(clock.frame(), 60);
    }

    #[test]
    fn long_frames_are_clamped_and_capped() {
        let mut clock = clock();
        let tick = clock.advance(10.0);
        assert!((tick.render_dt - 0.25).abs() < f32::EPSILON);
        assert_eq!(tick.sim_steps, 2);

        let config = TimingConfig {
            logic_hz: 100.0,
            max_steps_per_frame: 3,
            max_frame_dt: 1.0,
        };
        let mut fast = FrameClock::new(&config).unwrap();
        let tick = fast.advance(1.0);
        assert_eq!(tick.sim_steps, 3);
        // Backlog was dropped: the next short frame runs at most one step.
        assert!(fast.advance(0.01).sim_steps <= 1);
    }

    #[test]
    fn negative_and_nan_frames_do_nothing() {
        let mut clock = clock();
        assert_eq!(clock.advance(-1.0).sim_steps, 0);
        assert!(clock.advance(f32::NAN).render_dt.abs() < f32::EPSILON);
        assert!(clock.elapsed().abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_config_is_rejected() {
        for logic_hz in [0.0, -10.0, f32::INFINITY, f32::NAN] {
            let config = TimingConfig {
                logic_hz,
                ..TimingConfig::default()
            };
            assert!(FrameClock::new(&config).is_err(), "logic_hz = {logic_hz}");
        }
        let config = TimingConfig {
            max_frame_dt: f32::INFINITY,
            ..TimingConfig::default()
        };
        assert!(FrameClock::new(&config).is_err());
    }

    #[test]
    fn reset_returns_to_frame_zero() {
        let mut clock = clock();
        clock.advance(0.1);
        clock.reset();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.advance(0.05).frame, 1);
    }
}
