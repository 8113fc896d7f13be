//! Input source trait and idle implementation.
//!
//! Each frame the player agent polls an [`InputSource`] for a 2D movement
//! intent and an optional mask request. The trait abstracts the mechanism:
//! keyboard capture in a browser, a scripted autopilot, or a test stub.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use polarise_types::MaskType;

/// A request to change the player's mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskRequest {
    /// Put on the given mask.
    Wear(MaskType),
    /// Take the mask off.
    Neutral,
}

impl MaskRequest {
    /// The requested mask, `None` for neutral.
    pub const fn mask(self) -> Option<MaskType> {
        match self {
            Self::Wear(mask) => Some(mask),
            Self::Neutral => None,
        }
    }
}

/// Input sampled for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerInput {
    /// Movement intent: `x` is right, `y` is forward, each in `[-1, 1]`.
    pub movement: Vec2,
    /// Mask change requested this frame, if any.
    pub mask_request: Option<MaskRequest>,
}

impl PlayerInput {
    /// Input with only a movement intent.
    pub const fn moving(x: f32, y: f32) -> Self {
        Self {
            movement: Vec2::new(x, y),
            mask_request: None,
        }
    }

    /// Input with only a mask request.
    pub const fn mask(request: MaskRequest) -> Self {
        Self {
            movement: Vec2::ZERO,
            mask_request: Some(request),
        }
    }
}

/// A source of player input.
pub trait InputSource: core::fmt::Debug {
    /// Sample input for `frame`.
    fn poll(&mut self, frame: u64) -> PlayerInput;
}

/// Shared handle stored in the service registry under
/// [`keys::INPUT`](crate::registry::keys::INPUT).
pub type SharedInput = Rc<RefCell<dyn InputSource>>;

/// An input source that never moves and never changes mask.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleInput;

impl IdleInput {
    /// Create a new idle input source.
    pub const fn new() -> Self {
        Self
    }
}

impl InputSource for IdleInput {
    fn poll(&mut self, _frame: u64) -> PlayerInput {
        PlayerInput::default()
    }
}

/// Replays a fixed script, one entry per frame, then idles.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: Vec<PlayerInput>,
}

impl ScriptedInput {
    /// Create a source replaying `frames` starting at frame 1.
    pub const fn new(frames: Vec<PlayerInput>) -> Self {
        Self { frames }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, frame: u64) -> PlayerInput {
        usize::try_from(frame.saturating_sub(1))
            .ok()
            .and_then(|index| self.frames.get(index).copied())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_input_is_neutral() {
        let mut input = IdleInput::new();
        let sample = input.poll(7);
        assert_eq!(sample.movement, Vec2::ZERO);
        assert!(sample.mask_request.is_none());
    }

    #[test]
    fn scripted_input_replays_then_idles() {
        let mut input = ScriptedInput::new(vec![
            PlayerInput::moving(1.0, 0.0),
            PlayerInput::mask(MaskRequest::Wear(MaskType::Gold)),
        ]);
        assert_eq!(input.poll(1).movement, Vec2::X);
        assert_eq!(
            input.poll(2).mask_request.and_then(MaskRequest::mask),
            Some(MaskType::Gold)
        );
        assert_eq!(input.poll(3), PlayerInput::default());
    }
}
