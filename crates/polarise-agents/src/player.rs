//! The player agent: surface movement and mask selection.
//!
//! The player lives on the shell of radius `planet_radius + surface_offset`.
//! Each frame it polls the [`InputSource`](polarise_core::input::InputSource)
//! for a 2D intent, maps it onto the tangent plane using the camera's right
//! vector, and rotates its position along the great circle in that
//! direction. Rotating by `speed * dt / R` keeps surface speed constant at
//! every latitude.
//!
//! # Mask rules
//!
//! - Taking the mask off is refused while in a crowd or being chased.
//! - Putting a mask on is refused with no Energy left.
//! - Energy hitting zero forces the player back to neutral regardless.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, Vec3};
use polarise_core::clock::FrameTick;
use polarise_core::config::{GameConfig, PlayerConfig};
use polarise_core::coordinator::{GameStateListener, GameSystem, SystemError};
use polarise_core::game_state::SharedGameState;
use polarise_core::input::{IdleInput, SharedInput};
use polarise_core::registry::{ServiceRegistry, keys};
use polarise_core::scene::SharedScene;
use polarise_events::EventBus;
use polarise_types::{
    GameEvent, MaskRejectedDetails, MaskRejection, MaskType, PlayerMoveDetails, StateChange,
    Transform,
};
use polarise_world::{TangentBasis, project_to_shell, rotate_along_surface};
use tracing::{debug, warn};

use crate::error::AgentError;

/// Event source name.
const SOURCE: &str = "player";

/// Inputs shorter than this are ignored.
const DEAD_ZONE: f32 = 1e-3;

/// Shared handle stored in the service registry under [`keys::PLAYER`].
pub type SharedPlayer = Rc<RefCell<Player>>;

/// The player.
#[derive(Debug)]
pub struct Player {
    config: PlayerConfig,
    radius: f32,
    start_position: Vec3,
    transform: Transform,
    bus: EventBus,
    state: SharedGameState,
    scene: Option<SharedScene>,
    input: Option<SharedInput>,
}

impl Player {
    /// Create the player at its configured start position.
    pub fn new(config: &GameConfig, bus: EventBus, state: SharedGameState) -> Self {
        let radius = config.player_radius();
        let start_position = project_to_shell(Vec3::from(config.player.start_direction), radius);
        Self {
            config: config.player.clone(),
            radius,
            start_position,
            transform: Transform::new(start_position),
            bus,
            state,
            scene: None,
            input: None,
        }
    }

    /// Radius of the shell the player moves on.
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Current position.
    pub const fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Full transform for mesh placement.
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable transform, for placement by tests and scripted scenes.
    pub const fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Collision diameter.
    pub const fn size(&self) -> f32 {
        self.config.size
    }

    /// The mask the rules currently record for the player.
    pub fn current_mask(&self) -> Option<MaskType> {
        self.state.try_borrow().ok().and_then(|s| s.current_mask())
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    /// Move along the surface for `dt` seconds following `intent`
    /// (`x` right, `y` forward).
    ///
    /// Publishes `player.move` and returns the move when the player moved.
    pub fn move_by(&mut self, intent: Vec2, dt: f32) -> Option<PlayerMoveDetails> {
        let intent = intent.clamp_length_max(1.0);
        if intent.length() < DEAD_ZONE || dt.is_nan() || dt <= 0.0 {
            self.transform.velocity = Vec3::ZERO;
            return None;
        }

        let camera_right = self.scene.as_ref().map_or(Vec3::X, |s| s.camera_right());
        let basis = TangentBasis::at(self.transform.position, camera_right);
        let direction = basis.direction(intent.x, intent.y);
        if direction == Vec3::ZERO {
            return None;
        }

        let distance = self.config.speed * dt;
        self.transform.position =
            rotate_along_surface(self.transform.position, direction, distance, self.radius);
        self.transform.velocity = direction * self.config.speed;
        self.transform.strip_radial_velocity();
        self.transform.face_along_surface(direction);

        let details = PlayerMoveDetails {
            position: self.transform.position,
            direction,
            distance,
        };
        self.bus.publish(GameEvent::PlayerMove(details), SOURCE);
        Some(details)
    }

    // -----------------------------------------------------------------------
    // Masks
    // -----------------------------------------------------------------------

    /// Ask to wear `mask` (`None` takes the mask off).
    ///
    /// Returns `Ok(true)` when the mask changed and `Ok(false)` when it was
    /// already worn. A refusal publishes `player.mask_rejected`.
    pub fn request_mask(&mut self, mask: Option<MaskType>) -> Result<bool, AgentError> {
        let mut state = self.state.try_borrow_mut()?;
        let refusal = if state.is_game_over() {
            Some(MaskRejection::GameOver)
        } else if state.current_mask() == mask {
            return Ok(false);
        } else if mask.is_none() && !state.can_return_to_neutral() {
            Some(MaskRejection::CannotReturnToNeutral)
        } else if mask.is_some() && state.energy() <= 0.0 {
            Some(MaskRejection::NoEnergy)
        } else {
            None
        };

        if let Some(reason) = refusal {
            drop(state);
            debug!(requested = ?mask, ?reason, "mask request refused");
            self.bus.publish(
                GameEvent::PlayerMaskRejected(MaskRejectedDetails {
                    requested: mask,
                    reason,
                }),
                SOURCE,
            );
            return Err(AgentError::MaskRejected {
                requested: mask,
                reason,
            });
        }
        Ok(state.set_mask(mask, false))
    }

    fn force_neutral(&self) {
        let Ok(mut state) = self.state.try_borrow_mut() else {
            warn!("game state busy, cannot force neutral mask");
            return;
        };
        if state.current_mask().is_some() && state.set_mask(None, true) {
            debug!("energy depleted, mask removed");
        }
    }
}

impl GameStateListener for Player {
    fn on_game_state_change(&mut self, change: &StateChange) {
        if let StateChange::Energy { current, .. } = change
            && *current <= 0.0
        {
            self.force_neutral();
        }
    }
}

impl GameSystem for Player {
    fn name(&self) -> &'static str {
        "player"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn initialize(&mut self, registry: &ServiceRegistry) -> Result<(), SystemError> {
        if registry.contains(keys::SCENE) {
            let scene = registry.resolve::<SharedScene>(keys::SCENE)?;
            self.scene = Some(Rc::clone(scene.as_ref()));
        }
        let input: SharedInput = if registry.contains(keys::INPUT) {
            Rc::clone(registry.resolve::<SharedInput>(keys::INPUT)?.as_ref())
        } else {
            Rc::new(RefCell::new(IdleInput::new()))
        };
        self.input = Some(input);
        self.transform = Transform::new(self.start_position);
        Ok(())
    }

    fn update(&mut self, tick: &FrameTick) -> Result<(), SystemError> {
        let input = self
            .input
            .as_ref()
            .ok_or(AgentError::NotInitialized { system: SOURCE })?;
        let sample = input
            .try_borrow_mut()
            .map_err(|source| SystemError::Failed {
                system: SOURCE,
                reason: source.to_string(),
            })?
            .poll(tick.frame);

        if self.state.try_borrow().is_ok_and(|s| s.is_game_over()) {
            self.transform.velocity = Vec3::ZERO;
            return Ok(());
        }

        if let Some(request) = sample.mask_request {
            match self.request_mask(request.mask()) {
                Ok(_) | Err(AgentError::MaskRejected { .. }) => {}
                Err(err) => return Err(err.into()),
            }
        }
        self.move_by(sample.movement, tick.render_dt);
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SystemError> {
        self.transform = Transform::new(self.start_position);
        Ok(())
    }

    fn game_state_listener(&mut self) -> Option<&mut dyn GameStateListener> {
        Some(self)
    }
}
