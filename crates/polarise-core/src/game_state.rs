//! The game-state machine: meters, crowd flags, win conditions, score.
//!
//! [`GameState`] is the single owner of Outrage, Energy, the player's mask as
//! far as the rules are concerned, and the end-of-game decision. Other
//! systems mutate it only through the methods here, each of which publishes
//! change-only events on the bus.
//!
//! # Per-frame rules
//!
//! - Outside a crowd, Outrage decays.
//! - In a wrong crowd, Outrage rises and Energy drains.
//! - In a correct crowd, Outrage falls and Energy regenerates.
//! - While masked, Energy drains (rate may be zero).
//! - Outrage below the adult threshold for long enough ends the game
//!   ([`GameOverReason::Adult`]); at or above the chaos threshold for long
//!   enough ends it with [`GameOverReason::Chaos`]; Energy at zero for long
//!   enough ends it with [`GameOverReason::Energy`].
//!
//! Once the game is over every mutation is a no-op until [`GameState::reset`].

use std::cell::RefCell;
use std::rc::Rc;

use polarise_events::EventBus;
use polarise_types::{
    CrowdChangeDetails, GameEvent, GameOverDetails, GameOverReason, GameStateSnapshot,
    MaskChangeDetails, MaskType, MeterChangeDetails, StateChange,
};
use tracing::{debug, info};

use crate::clock::FrameTick;
use crate::config::{GameConfig, MetersConfig, ScoringConfig, WinConditionsConfig};
use crate::coordinator::{GameSystem, SystemError};
use crate::registry::{ServiceRegistry, keys};
use crate::scene::SharedScene;

/// Upper bound of both meters.
pub const METER_MAX: f32 = 100.0;

/// Event source name.
const SOURCE: &str = "game_state";

/// Shared handle stored in the service registry under
/// [`keys::GAME_STATE`].
pub type SharedGameState = Rc<RefCell<GameState>>;

/// Meters, flags, and timers for one round.
#[derive(Debug)]
pub struct GameState {
    bus: EventBus,
    scene: Option<SharedScene>,
    meters: MetersConfig,
    win: WinConditionsConfig,
    scoring: ScoringConfig,

    outrage: f32,
    energy: f32,
    game_time: f32,
    polarised_people: u32,
    current_mask: Option<MaskType>,
    is_game_over: bool,
    game_over_reason: Option<GameOverReason>,
    in_crowd: bool,
    in_wrong_crowd: bool,
    is_being_chased: bool,
    adult_timer: f32,
    chaos_timer: f32,
    exhaustion_timer: f32,
}

impl GameState {
    /// Create a fresh state publishing on `bus`.
    pub fn new(config: &GameConfig, bus: EventBus) -> Self {
        let meters = config.meters.clone();
        Self {
            bus,
            scene: None,
            outrage: meters.initial_outrage.clamp(0.0, METER_MAX),
            energy: meters.initial_energy.clamp(0.0, METER_MAX),
            meters,
            win: config.win_conditions.clone(),
            scoring: config.scoring.clone(),
            game_time: 0.0,
            polarised_people: 0,
            current_mask: None,
            is_game_over: false,
            game_over_reason: None,
            in_crowd: false,
            in_wrong_crowd: false,
            is_being_chased: false,
            adult_timer: 0.0,
            chaos_timer: 0.0,
            exhaustion_timer: 0.0,
        }
    }

    /// Attach the scene collaborator used for the background hook.
    #[must_use]
    pub fn with_scene(mut self, scene: SharedScene) -> Self {
        self.scene = Some(scene);
        self
    }

    // -----------------------------------------------------------------------
    // Meters
    // -----------------------------------------------------------------------

    /// Add `delta` to Outrage, clamped to `[0, 100]`.
    ///
    /// Returns whether the value changed.
    pub fn add_outrage(&mut self, delta: f32) -> bool {
        let Some(change) = self.apply_meter(self.outrage, delta) else {
            return false;
        };
        self.outrage = change.current;
        self.bus.publish(GameEvent::GameOutrageChange(change), SOURCE);
        self.bus.publish(
            GameEvent::GameStateChange(StateChange::Outrage {
                previous: change.previous,
                current: change.current,
            }),
            SOURCE,
        );
        true
    }

    /// Add `delta` to Energy, clamped to `[0, 100]`.
    ///
    /// Returns whether the value changed.
    pub fn add_energy(&mut self, delta: f32) -> bool {
        let Some(change) = self.apply_meter(self.energy, delta) else {
            return false;
        };
        self.energy = change.current;
        self.bus.publish(GameEvent::PlayerEnergyChange(change), SOURCE);
        self.bus.publish(
            GameEvent::GameStateChange(StateChange::Energy {
                previous: change.previous,
                current: change.current,
            }),
            SOURCE,
        );
        true
    }

    fn apply_meter(&self, previous: f32, delta: f32) -> Option<MeterChangeDetails> {
        if self.is_game_over || !delta.is_finite() {
            return None;
        }
        let current = (previous + delta).clamp(0.0, METER_MAX);
        meter_changed(previous, current).then_some(MeterChangeDetails { previous, current })
    }

    // -----------------------------------------------------------------------
    // Mask and flags
    // -----------------------------------------------------------------------

    /// Record the player's mask (`None` is neutral).
    ///
    /// Publishes `player.mask_change` and recolours the scene background.
    /// `forced` marks a change imposed by energy depletion.
    pub fn set_mask(&mut self, mask: Option<MaskType>, forced: bool) -> bool {
        if self.is_game_over || self.current_mask == mask {
            return false;
        }
        let previous = self.current_mask;
        self.current_mask = mask;
        debug!(?previous, current = ?mask, forced, "mask changed");

        self.bus.publish(
            GameEvent::PlayerMaskChange(MaskChangeDetails {
                previous,
                current: mask,
                forced,
            }),
            SOURCE,
        );
        self.bus.publish(
            GameEvent::GameStateChange(StateChange::Mask {
                previous,
                current: mask,
            }),
            SOURCE,
        );
        if let Some(scene) = &self.scene {
            scene.set_background_from_mask(mask);
        }
        true
    }

    /// Set whether the player stands in a crowd.
    pub fn set_in_crowd(&mut self, value: bool) -> bool {
        if self.is_game_over || self.in_crowd == value {
            return false;
        }
        self.in_crowd = value;
        self.publish_crowd();
        self.publish_state(StateChange::InCrowd { value });
        true
    }

    /// Set whether the player's crowd mostly wears a different mask.
    pub fn set_in_wrong_crowd(&mut self, value: bool) -> bool {
        if self.is_game_over || self.in_wrong_crowd == value {
            return false;
        }
        self.in_wrong_crowd = value;
        self.publish_crowd();
        self.publish_state(StateChange::InWrongCrowd { value });
        true
    }

    /// Set whether police are pursuing the player.
    pub fn set_being_chased(&mut self, value: bool) -> bool {
        if self.is_game_over || self.is_being_chased == value {
            return false;
        }
        self.is_being_chased = value;
        self.publish_state(StateChange::BeingChased { value });
        true
    }

    /// Count `count` more polarised NPCs.
    pub fn add_polarised_people(&mut self, count: u32) {
        if self.is_game_over || count == 0 {
            return;
        }
        self.polarised_people = self.polarised_people.saturating_add(count);
        self.publish_state(StateChange::PolarisedPeople {
            total: self.polarised_people,
        });
    }

    fn publish_crowd(&self) {
        self.bus.publish(
            GameEvent::GameCrowdChange(CrowdChangeDetails {
                in_crowd: self.in_crowd,
                in_wrong_crowd: self.in_wrong_crowd,
            }),
            SOURCE,
        );
    }

    fn publish_state(&self, change: StateChange) {
        self.bus.publish(GameEvent::GameStateChange(change), SOURCE);
    }

    // -----------------------------------------------------------------------
    // Frame update and end of game
    // -----------------------------------------------------------------------

    /// Advance the round by `dt` seconds: game time, meter rates, and the
    /// three win-condition timers.
    pub fn advance(&mut self, dt: f32) {
        if self.is_game_over || dt.is_nan() || dt <= 0.0 {
            return;
        }
        self.game_time += dt;

        if !self.in_crowd {
            self.add_outrage(-self.meters.outrage_decay_rate * dt);
        } else if self.in_wrong_crowd {
            self.add_outrage(self.meters.wrong_crowd_outrage_rate * dt);
            self.add_energy(-self.meters.wrong_crowd_energy_drain * dt);
        } else {
            self.add_outrage(-self.meters.correct_crowd_outrage_rate * dt);
            self.add_energy(self.meters.correct_crowd_energy_regen * dt);
        }
        if self.current_mask.is_some() && self.meters.mask_energy_drain_rate > 0.0 {
            self.add_energy(-self.meters.mask_energy_drain_rate * dt);
        }

        self.adult_timer = if self.outrage < self.win.adult_threshold {
            self.adult_timer + dt
        } else {
            0.0
        };
        self.chaos_timer = if self.outrage >= self.win.chaos_threshold {
            self.chaos_timer + dt
        } else {
            0.0
        };
        self.exhaustion_timer = if self.energy <= 0.0 {
            self.exhaustion_timer + dt
        } else {
            0.0
        };

        if self.chaos_timer >= self.win.chaos_time_required {
            self.end_game(GameOverReason::Chaos);
        } else if self.adult_timer >= self.win.adult_time_required {
            self.end_game(GameOverReason::Adult);
        } else if self.exhaustion_timer >= self.win.energy_depleted_time_required {
            self.end_game(GameOverReason::Energy);
        }
    }

    /// End the round. Only the first call has any effect.
    ///
    /// Returns whether this call ended the game.
    pub fn end_game(&mut self, reason: GameOverReason) -> bool {
        if self.is_game_over {
            return false;
        }
        self.is_game_over = true;
        self.game_over_reason = Some(reason);
        let score = self.score();
        info!(
            reason = reason.code(),
            score,
            game_time = self.game_time,
            polarised_people = self.polarised_people,
            "game over"
        );
        self.publish_state(StateChange::GameOver { reason });
        self.bus.publish(
            GameEvent::GameOver(GameOverDetails {
                reason,
                score,
                game_time: self.game_time,
                polarised_people: self.polarised_people,
            }),
            SOURCE,
        );
        true
    }

    /// Restore the configured initial values.
    pub fn reset(&mut self) {
        self.outrage = self.meters.initial_outrage.clamp(0.0, METER_MAX);
        self.energy = self.meters.initial_energy.clamp(0.0, METER_MAX);
        self.game_time = 0.0;
        self.polarised_people = 0;
        self.current_mask = None;
        self.is_game_over = false;
        self.game_over_reason = None;
        self.in_crowd = false;
        self.in_wrong_crowd = false;
        self.is_being_chased = false;
        self.adult_timer = 0.0;
        self.chaos_timer = 0.0;
        self.exhaustion_timer = 0.0;
        if let Some(scene) = &self.scene {
            scene.set_background_from_mask(None);
        }
        self.publish_state(StateChange::Reset);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// `game_time * alpha + polarised_people * beta`.
    pub fn score(&self) -> f32 {
        self.game_time * self.scoring.alpha + self.polarised_people as f32 * self.scoring.beta
    }

    /// Outrage in `[0, 100]`.
    pub const fn outrage(&self) -> f32 {
        self.outrage
    }

    /// Energy in `[0, 100]`.
    pub const fn energy(&self) -> f32 {
        self.energy
    }

    /// Seconds survived.
    pub const fn game_time(&self) -> f32 {
        self.game_time
    }

    /// NPCs polarised so far.
    pub const fn polarised_people(&self) -> u32 {
        self.polarised_people
    }

    /// The player's mask.
    pub const fn current_mask(&self) -> Option<MaskType> {
        self.current_mask
    }

    /// Whether the round has ended.
    pub const fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    /// Why the round ended.
    pub const fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over_reason
    }

    /// Whether the player stands in a crowd.
    pub const fn in_crowd(&self) -> bool {
        self.in_crowd
    }

    /// Whether the player's crowd mostly wears another mask.
    pub const fn in_wrong_crowd(&self) -> bool {
        self.in_wrong_crowd
    }

    /// Whether police are pursuing.
    pub const fn is_being_chased(&self) -> bool {
        self.is_being_chased
    }

    /// Taking the mask off needs no crowd around and no pursuit.
    pub const fn can_return_to_neutral(&self) -> bool {
        !self.in_crowd && !self.is_being_chased
    }

    /// Everything the HUD binds to.
    pub fn full_state(&self) -> GameStateSnapshot {
        GameStateSnapshot {
            outrage: self.outrage,
            energy: self.energy,
            game_time: self.game_time,
            polarised_people: self.polarised_people,
            current_mask: self.current_mask,
            is_game_over: self.is_game_over,
            game_over_reason: self.game_over_reason,
            in_crowd: self.in_crowd,
            in_wrong_crowd: self.in_wrong_crowd,
            is_being_chased: self.is_being_chased,
            adult_timer: self.adult_timer,
            chaos_timer: self.chaos_timer,
            exhaustion_timer: self.exhaustion_timer,
            score: self.score(),
        }
    }
}

#[allow(clippy::float_cmp)]
fn meter_changed(previous: f32, current: f32) -> bool {
    previous != current
}

impl GameSystem for GameState {
    fn name(&self) -> &'static str {
        "game_state"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn initialize(&mut self, registry: &ServiceRegistry) -> Result<(), SystemError> {
        if self.scene.is_none() && registry.contains(keys::SCENE) {
            let scene = registry.resolve::<SharedScene>(keys::SCENE)?;
            self.scene = Some(Rc::clone(scene.as_ref()));
        }
        if let Some(scene) = &self.scene {
            scene.set_background_from_mask(self.current_mask);
        }
        Ok(())
    }

    fn update(&mut self, tick: &FrameTick) -> Result<(), SystemError> {
        self.advance(tick.render_dt);
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SystemError> {
        GameState::reset(self);
        Ok(())
    }
}
