//! Read-only views handed to the HUD and session callbacks.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{GameOverReason, MaskType};

/// Full game-state view bound by the HUD each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameStateSnapshot {
    /// Outrage meter in `[0, 100]`.
    pub outrage: f32,
    /// Energy meter in `[0, 100]`.
    pub energy: f32,
    /// Seconds survived.
    pub game_time: f32,
    /// NPCs polarised so far.
    pub polarised_people: u32,
    /// The player's mask; `None` is neutral.
    pub current_mask: Option<MaskType>,
    /// Whether the game has ended.
    pub is_game_over: bool,
    /// Why the game ended, once it has.
    pub game_over_reason: Option<GameOverReason>,
    /// Whether the player stands in a crowd.
    pub in_crowd: bool,
    /// Whether that crowd mostly wears a different mask.
    pub in_wrong_crowd: bool,
    /// Whether police are pursuing.
    pub is_being_chased: bool,
    /// Seconds spent below the adult threshold.
    pub adult_timer: f32,
    /// Seconds spent at or above the chaos threshold.
    pub chaos_timer: f32,
    /// Seconds spent with no energy.
    pub exhaustion_timer: f32,
    /// Current score.
    pub score: f32,
}

impl GameStateSnapshot {
    /// Whether the player currently wears a mask.
    pub const fn is_masked(&self) -> bool {
        self.current_mask.is_some()
    }
}

/// Per-drone view for renderers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PoliceSnapshot {
    /// Whether pursuit is active.
    pub active: bool,
    /// Drones alive, including retreating ones.
    pub drones: u32,
    /// Drones currently pursuing the player.
    pub pursuing: u32,
}
