//! Enumeration types for the Polarise simulation.
//!
//! Masks, agent behaviour states, and the reasons a game can end.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Masks
// ---------------------------------------------------------------------------

/// Number of non-neutral masks (and therefore NPC groups).
pub const MASK_COUNT: usize = 7;

/// An ideological mask.
///
/// The player wears at most one mask at a time; the absence of a mask
/// (`Option::None` wherever a player mask is stored) is the neutral state.
/// Every NPC belongs to exactly one mask group for its whole life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum MaskType {
    /// Mask 1.
    Crimson,
    /// Mask 2.
    Amber,
    /// Mask 3.
    Gold,
    /// Mask 4.
    Jade,
    /// Mask 5.
    Azure,
    /// Mask 6.
    Indigo,
    /// Mask 7.
    Violet,
}

impl MaskType {
    /// Every mask in index order.
    pub const ALL: [Self; MASK_COUNT] = [
        Self::Crimson,
        Self::Amber,
        Self::Gold,
        Self::Jade,
        Self::Azure,
        Self::Indigo,
        Self::Violet,
    ];

    /// The 1-based mask number (1..=7).
    pub const fn index(self) -> u8 {
        match self {
            Self::Crimson => 1,
            Self::Amber => 2,
            Self::Gold => 3,
            Self::Jade => 4,
            Self::Azure => 5,
            Self::Indigo => 6,
            Self::Violet => 7,
        }
    }

    /// Zero-based slot, suitable for per-mask tables.
    pub const fn slot(self) -> usize {
        match self {
            Self::Crimson => 0,
            Self::Amber => 1,
            Self::Gold => 2,
            Self::Jade => 3,
            Self::Azure => 4,
            Self::Indigo => 5,
            Self::Violet => 6,
        }
    }

    /// Look up a mask by its 1-based number. Returns `None` outside 1..=7.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Self::Crimson),
            2 => Some(Self::Amber),
            3 => Some(Self::Gold),
            4 => Some(Self::Jade),
            5 => Some(Self::Azure),
            6 => Some(Self::Indigo),
            7 => Some(Self::Violet),
            _ => None,
        }
    }

    /// Background colour associated with the mask, as `0xRRGGBB`.
    ///
    /// Consumed by the scene collaborator when the player changes mask.
    pub const fn background_rgb(self) -> u32 {
        match self {
            Self::Crimson => 0x5a_1a1a,
            Self::Amber => 0x5a_3a12,
            Self::Gold => 0x55_4d14,
            Self::Jade => 0x17_4a2c,
            Self::Azure => 0x16_3a5c,
            Self::Indigo => 0x24_1f5a,
            Self::Violet => 0x4a_1f55,
        }
    }
}

impl core::fmt::Display for MaskType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Crimson => "crimson",
            Self::Amber => "amber",
            Self::Gold => "gold",
            Self::Jade => "jade",
            Self::Azure => "azure",
            Self::Indigo => "indigo",
            Self::Violet => "violet",
        };
        write!(f, "{name}")
    }
}

/// Background colour shown while the player is neutral.
pub const NEUTRAL_BACKGROUND_RGB: u32 = 0x10_1418;

// ---------------------------------------------------------------------------
// Agent states
// ---------------------------------------------------------------------------

/// Behaviour state of a single NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NpcState {
    /// Standing around; no wander force, extra damping.
    #[default]
    Idle,
    /// Walking toward a random wander target.
    Wandering,
    /// Pulling toward the group center.
    Gathering,
}

/// Behaviour state of a police drone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DroneState {
    /// Patrolling between random points at patrol altitude.
    #[default]
    Searching,
    /// Chasing the player.
    Pursuing,
    /// Flying away from the planet; destroyed once far enough.
    Retreating,
}

// ---------------------------------------------------------------------------
// Game outcome
// ---------------------------------------------------------------------------

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameOverReason {
    /// A police drone reached the player.
    Caught,
    /// Outrage stayed at the chaos threshold long enough.
    Chaos,
    /// Outrage stayed below the adult threshold long enough.
    Adult,
    /// Energy stayed depleted long enough.
    Energy,
}

impl GameOverReason {
    /// Upper-case reason code shown on the game-over screen.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Caught => "CAUGHT",
            Self::Chaos => "CHAOS",
            Self::Adult => "ADULT",
            Self::Energy => "ENERGY",
        }
    }
}

impl core::fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// Why a mask request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum MaskRejection {
    /// Returning to neutral while in a crowd or being chased.
    CannotReturnToNeutral,
    /// Putting on a mask with no energy left.
    NoEnergy,
    /// The game is already over.
    GameOver,
}

/// Outcome of a single player-NPC interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum InteractionOutcome {
    /// The player wore no mask; the NPC's accumulated influence decayed.
    Neutral,
    /// Player and NPC share a mask.
    Aligned,
    /// Player and NPC wear different masks.
    Opposed,
}
