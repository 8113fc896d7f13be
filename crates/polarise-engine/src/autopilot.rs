//! Scripted player for headless sessions.
//!
//! [`AutopilotInput`] wanders: it holds a random heading for a while, then
//! picks another, and now and then asks for a random mask or to go neutral.
//! Refused requests are fine; the player agent reports and ignores them.

use glam::Vec2;
use polarise_core::input::{InputSource, MaskRequest, PlayerInput};
use polarise_types::MaskType;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Frames a heading is held before a new one is drawn.
const DEFAULT_HOLD_FRAMES: u64 = 90;

/// Chance per heading change of also requesting a mask change.
const MASK_CHANGE_CHANCE: f64 = 0.35;

/// Share of mask requests that ask to go neutral.
const NEUTRAL_CHANCE: f64 = 0.25;

/// Random-walk input source.
#[derive(Debug, Clone)]
pub struct AutopilotInput {
    rng: SmallRng,
    hold_frames: u64,
    heading: Vec2,
    next_change: u64,
}

impl AutopilotInput {
    /// Create an autopilot seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_hold_frames(seed, DEFAULT_HOLD_FRAMES)
    }

    /// Create an autopilot that changes heading every `hold_frames` frames.
    pub fn with_hold_frames(seed: u64, hold_frames: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            hold_frames: hold_frames.max(1),
            heading: Vec2::ZERO,
            next_change: 0,
        }
    }

    fn draw_heading(&mut self) -> Vec2 {
        let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
        let throttle = self.rng.random_range(0.5..=1.0_f32);
        Vec2::from_angle(angle) * throttle
    }

    fn draw_mask_request(&mut self) -> Option<MaskRequest> {
        if !self.rng.random_bool(MASK_CHANGE_CHANCE) {
            return None;
        }
        if self.rng.random_bool(NEUTRAL_CHANCE) {
            return Some(MaskRequest::Neutral);
        }
        let slot = self.rng.random_range(0..MaskType::ALL.len());
        MaskType::ALL.get(slot).copied().map(MaskRequest::Wear)
    }
}

impl InputSource for AutopilotInput {
    fn poll(&mut self, frame: u64) -> PlayerInput {
        let mut mask_request = None;
        if frame >= self.next_change {
            self.heading = self.draw_heading();
            mask_request = self.draw_mask_request();
            self.next_change = frame.saturating_add(self.hold_frames);
        }
        PlayerInput {
            movement: self.heading,
            mask_request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_stays_in_unit_square() {
        let mut autopilot = AutopilotInput::with_hold_frames(7, 3);
        for frame in 1..=600 {
            let input = autopilot.poll(frame);
            assert!(input.movement.x.abs() <= 1.0);
            assert!(input.movement.y.abs() <= 1.0);
            assert!(input.movement.length() > 0.0);
        }
    }

    #[test]
    fn heading_is_held_between_changes() {
        let mut autopilot = AutopilotInput::with_hold_frames(1, 10);
        let first = autopilot.poll(1).movement;
        for frame in 2..=10 {
            let input = autopilot.poll(frame);
            assert_eq!(input.movement, first);
            assert!(input.mask_request.is_none());
        }
    }

    #[test]
    fn requests_masks_sometimes() {
        let mut autopilot = AutopilotInput::with_hold_frames(3, 1);
        let requests = (1..=200)
            .filter_map(|frame| autopilot.poll(frame).mask_request)
            .count();
        assert!(requests > 0);
        assert!(requests < 200);
    }

    #[test]
    fn same_seed_same_script() {
        let mut a = AutopilotInput::new(11);
        let mut b = AutopilotInput::new(11);
        for frame in 1..=500 {
            assert_eq!(a.poll(frame), b.poll(frame));
        }
    }
}
