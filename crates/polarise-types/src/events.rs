//! The event vocabulary.
//!
//! Every event is a [`GameEvent`] variant carrying its own strongly-typed
//! payload. The dotted tag (`player.move`, `game.over`, ...) is derived from
//! the variant through [`EventKind`], so subscribers match on a closed set of
//! kinds and handlers pattern-match on the payload instead of reading
//! loosely-named fields.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{GameOverReason, InteractionOutcome, MaskRejection, MaskType};
use crate::ids::{DroneId, EventId, NpcId};

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// The closed set of event kinds subscribers can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// The player moved on the surface.
    #[serde(rename = "player.move")]
    PlayerMove,
    /// The player's mask changed.
    #[serde(rename = "player.mask_change")]
    PlayerMaskChange,
    /// A mask request was refused.
    #[serde(rename = "player.mask_rejected")]
    PlayerMaskRejected,
    /// The Energy meter changed.
    #[serde(rename = "player.energy_change")]
    PlayerEnergyChange,
    /// Any game-state field changed.
    #[serde(rename = "game.state_change")]
    GameStateChange,
    /// The Outrage meter changed.
    #[serde(rename = "game.outrage_change")]
    GameOutrageChange,
    /// Crowd membership flags changed.
    #[serde(rename = "game.crowd_change")]
    GameCrowdChange,
    /// The game ended.
    #[serde(rename = "game.over")]
    GameOver,
    /// The game was reset for another round.
    #[serde(rename = "game.restart")]
    GameRestart,
    /// A system finished initialization.
    #[serde(rename = "system.initialize")]
    SystemInitialize,
    /// A system shut down.
    #[serde(rename = "system.shutdown")]
    SystemShutdown,
    /// A system failed during a lifecycle call or frame update.
    #[serde(rename = "system.error")]
    SystemError,
    /// An NPC group was spawned.
    #[serde(rename = "npc.spawn")]
    NpcSpawn,
    /// The player interacted with an NPC.
    #[serde(rename = "npc.interaction")]
    NpcInteraction,
    /// Crowd composition around the player was recomputed.
    #[serde(rename = "npc.crowd_update")]
    NpcCrowdUpdate,
    /// Police pursuit switched on.
    #[serde(rename = "police.activate")]
    PoliceActivate,
    /// Police pursuit switched off.
    #[serde(rename = "police.deactivate")]
    PoliceDeactivate,
    /// A drone was spawned.
    #[serde(rename = "police.drone_spawn")]
    PoliceDroneSpawn,
    /// A drone finished retreating and was removed.
    #[serde(rename = "police.drone_destroyed")]
    PoliceDroneDestroyed,
    /// A drone spotted the player and started pursuing.
    #[serde(rename = "police.pursuit")]
    PolicePursuit,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 20] = [
        Self::PlayerMove,
        Self::PlayerMaskChange,
        Self::PlayerMaskRejected,
        Self::PlayerEnergyChange,
        Self::GameStateChange,
        Self::GameOutrageChange,
        Self::GameCrowdChange,
        Self::GameOver,
        Self::GameRestart,
        Self::SystemInitialize,
        Self::SystemShutdown,
        Self::SystemError,
        Self::NpcSpawn,
        Self::NpcInteraction,
        Self::NpcCrowdUpdate,
        Self::PoliceActivate,
        Self::PoliceDeactivate,
        Self::PoliceDroneSpawn,
        Self::PoliceDroneDestroyed,
        Self::PolicePursuit,
    ];

    /// The dotted wire name of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlayerMove => "player.move",
            Self::PlayerMaskChange => "player.mask_change",
            Self::PlayerMaskRejected => "player.mask_rejected",
            Self::PlayerEnergyChange => "player.energy_change",
            Self::GameStateChange => "game.state_change",
            Self::GameOutrageChange => "game.outrage_change",
            Self::GameCrowdChange => "game.crowd_change",
            Self::GameOver => "game.over",
            Self::GameRestart => "game.restart",
            Self::SystemInitialize => "system.initialize",
            Self::SystemShutdown => "system.shutdown",
            Self::SystemError => "system.error",
            Self::NpcSpawn => "npc.spawn",
            Self::NpcInteraction => "npc.interaction",
            Self::NpcCrowdUpdate => "npc.crowd_update",
            Self::PoliceActivate => "police.activate",
            Self::PoliceDeactivate => "police.deactivate",
            Self::PoliceDroneSpawn => "police.drone_spawn",
            Self::PoliceDroneDestroyed => "police.drone_destroyed",
            Self::PolicePursuit => "police.pursuit",
        }
    }

    /// Whether this kind describes something the player did.
    pub const fn is_player_action(self) -> bool {
        matches!(
            self,
            Self::PlayerMove | Self::PlayerMaskChange | Self::PlayerMaskRejected
        )
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Payload of `player.move`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerMoveDetails {
    /// Position after the move.
    #[ts(as = "[f32; 3]")]
    pub position: Vec3,
    /// Unit tangent direction of travel.
    #[ts(as = "[f32; 3]")]
    pub direction: Vec3,
    /// Arc length travelled this frame.
    pub distance: f32,
}

/// Payload of `player.mask_change`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MaskChangeDetails {
    /// Mask before the change; `None` is neutral.
    pub previous: Option<MaskType>,
    /// Mask after the change; `None` is neutral.
    pub current: Option<MaskType>,
    /// Whether the change was forced by energy depletion.
    pub forced: bool,
}

/// Payload of `player.mask_rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MaskRejectedDetails {
    /// The mask that was requested; `None` is neutral.
    pub requested: Option<MaskType>,
    /// Why the request was refused.
    pub reason: MaskRejection,
}

/// Payload of `game.outrage_change` and `player.energy_change`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MeterChangeDetails {
    /// Value before the change.
    pub previous: f32,
    /// Value after clamping.
    pub current: f32,
}

impl MeterChangeDetails {
    /// Signed change actually applied after clamping.
    pub fn delta(&self) -> f32 {
        self.current - self.previous
    }

    /// Whether the meter has hit zero.
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

/// Payload of `game.state_change`: which field changed and how.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum StateChange {
    /// Outrage meter changed.
    Outrage {
        /// Previous value.
        previous: f32,
        /// New value.
        current: f32,
    },
    /// Energy meter changed.
    Energy {
        /// Previous value.
        previous: f32,
        /// New value.
        current: f32,
    },
    /// Player mask changed.
    Mask {
        /// Previous mask.
        previous: Option<MaskType>,
        /// New mask.
        current: Option<MaskType>,
    },
    /// In-crowd flag changed.
    InCrowd {
        /// New value.
        value: bool,
    },
    /// Wrong-crowd flag changed.
    InWrongCrowd {
        /// New value.
        value: bool,
    },
    /// Being-chased flag changed.
    BeingChased {
        /// New value.
        value: bool,
    },
    /// Polarised-people counter increased.
    PolarisedPeople {
        /// New total.
        total: u32,
    },
    /// The game ended.
    GameOver {
        /// Why it ended.
        reason: GameOverReason,
    },
    /// The state was reset to its initial values.
    Reset,
}

/// Payload of `game.crowd_change`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CrowdChangeDetails {
    /// Whether the player is in a crowd.
    pub in_crowd: bool,
    /// Whether that crowd is mostly wearing a different mask.
    pub in_wrong_crowd: bool,
}

/// Payload of `game.over`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameOverDetails {
    /// Why the game ended.
    pub reason: GameOverReason,
    /// Final score.
    pub score: f32,
    /// Seconds survived.
    pub game_time: f32,
    /// NPCs polarised during the game.
    pub polarised_people: u32,
}

/// Payload of `system.initialize` and `system.shutdown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SystemDetails {
    /// Name of the system.
    pub system: String,
}

/// Payload of `system.error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SystemErrorDetails {
    /// Name of the failing system.
    pub system: String,
    /// Lifecycle phase that failed (`initialize`, `update`, `shutdown`, `reset`).
    pub phase: String,
    /// Rendered error message.
    pub message: String,
}

/// Payload of `npc.spawn`, published once per group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NpcSpawnDetails {
    /// Mask of the spawned group.
    pub mask: MaskType,
    /// Number of NPCs spawned.
    pub count: u32,
    /// Surface point the group was spawned around.
    #[ts(as = "[f32; 3]")]
    pub spawn_center: Vec3,
}

/// Payload of `npc.interaction`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NpcInteractionDetails {
    /// The NPC involved.
    pub npc_id: NpcId,
    /// The NPC's mask.
    pub npc_mask: MaskType,
    /// The player's mask at the time; `None` is neutral.
    pub player_mask: Option<MaskType>,
    /// Interaction outcome.
    pub outcome: InteractionOutcome,
    /// The NPC's player influence after the interaction.
    pub influence: f32,
}

/// Payload of `npc.crowd_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CrowdUpdateDetails {
    /// NPCs within crowd-detection range.
    pub nearby: u32,
    /// Of those, NPCs wearing the player's mask.
    pub matching: u32,
    /// Count per mask among nearby NPCs.
    pub composition: BTreeMap<MaskType, u32>,
    /// Whether the nearby count reaches the minimum crowd size.
    pub in_crowd: bool,
    /// Whether a strict majority wears a different mask than the player.
    pub in_wrong_crowd: bool,
}

/// Payload of `police.activate` and `police.deactivate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PoliceStatusDetails {
    /// Outrage at the moment of the transition.
    pub outrage: f32,
    /// Drones currently alive.
    pub active_drones: u32,
}

/// Payload of `police.drone_spawn` and `police.drone_destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DroneDetails {
    /// The drone.
    pub drone_id: DroneId,
    /// Its position at the time of the event.
    #[ts(as = "[f32; 3]")]
    pub position: Vec3,
}

/// Payload of `police.pursuit`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PursuitDetails {
    /// The pursuing drone.
    pub drone_id: DroneId,
    /// Distance to the player when pursuit began.
    pub distance: f32,
}

// ---------------------------------------------------------------------------
// Tagged union
// ---------------------------------------------------------------------------

/// Every event the simulation publishes, one variant per [`EventKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", content = "data")]
pub enum GameEvent {
    /// `player.move`
    #[serde(rename = "player.move")]
    PlayerMove(PlayerMoveDetails),
    /// `player.mask_change`
    #[serde(rename = "player.mask_change")]
    PlayerMaskChange(MaskChangeDetails),
    /// `player.mask_rejected`
    #[serde(rename = "player.mask_rejected")]
    PlayerMaskRejected(MaskRejectedDetails),
    /// `player.energy_change`
    #[serde(rename = "player.energy_change")]
    PlayerEnergyChange(MeterChangeDetails),
    /// `game.state_change`
    #[serde(rename = "game.state_change")]
    GameStateChange(StateChange),
    /// `game.outrage_change`
    #[serde(rename = "game.outrage_change")]
    GameOutrageChange(MeterChangeDetails),
    /// `game.crowd_change`
    #[serde(rename = "game.crowd_change")]
    GameCrowdChange(CrowdChangeDetails),
    /// `game.over`
    #[serde(rename = "game.over")]
    GameOver(GameOverDetails),
    /// `game.restart`
    #[serde(rename = "game.restart")]
    GameRestart,
    /// `system.initialize`
    #[serde(rename = "system.initialize")]
    SystemInitialize(SystemDetails),
    /// `system.shutdown`
    #[serde(rename = "system.shutdown")]
    SystemShutdown(SystemDetails),
    /// `system.error`
    #[serde(rename = "system.error")]
    SystemError(SystemErrorDetails),
    /// `npc.spawn`
    #[serde(rename = "npc.spawn")]
    NpcSpawn(NpcSpawnDetails),
    /// `npc.interaction`
    #[serde(rename = "npc.interaction")]
    NpcInteraction(NpcInteractionDetails),
    /// `npc.crowd_update`
    #[serde(rename = "npc.crowd_update")]
    NpcCrowdUpdate(CrowdUpdateDetails),
    /// `police.activate`
    #[serde(rename = "police.activate")]
    PoliceActivate(PoliceStatusDetails),
    /// `police.deactivate`
    #[serde(rename = "police.deactivate")]
    PoliceDeactivate(PoliceStatusDetails),
    /// `police.drone_spawn`
    #[serde(rename = "police.drone_spawn")]
    PoliceDroneSpawn(DroneDetails),
    /// `police.drone_destroyed`
    #[serde(rename = "police.drone_destroyed")]
    PoliceDroneDestroyed(DroneDetails),
    /// `police.pursuit`
    #[serde(rename = "police.pursuit")]
    PolicePursuit(PursuitDetails),
}

impl GameEvent {
    /// The kind tag of this payload.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::PlayerMove(_) => EventKind::PlayerMove,
            Self::PlayerMaskChange(_) => EventKind::PlayerMaskChange,
            Self::PlayerMaskRejected(_) => EventKind::PlayerMaskRejected,
            Self::PlayerEnergyChange(_) => EventKind::PlayerEnergyChange,
            Self::GameStateChange(_) => EventKind::GameStateChange,
            Self::GameOutrageChange(_) => EventKind::GameOutrageChange,
            Self::GameCrowdChange(_) => EventKind::GameCrowdChange,
            Self::GameOver(_) => EventKind::GameOver,
            Self::GameRestart => EventKind::GameRestart,
            Self::SystemInitialize(_) => EventKind::SystemInitialize,
            Self::SystemShutdown(_) => EventKind::SystemShutdown,
            Self::SystemError(_) => EventKind::SystemError,
            Self::NpcSpawn(_) => EventKind::NpcSpawn,
            Self::NpcInteraction(_) => EventKind::NpcInteraction,
            Self::NpcCrowdUpdate(_) => EventKind::NpcCrowdUpdate,
            Self::PoliceActivate(_) => EventKind::PoliceActivate,
            Self::PoliceDeactivate(_) => EventKind::PoliceDeactivate,
            Self::PoliceDroneSpawn(_) => EventKind::PoliceDroneSpawn,
            Self::PoliceDroneDestroyed(_) => EventKind::PoliceDroneDestroyed,
            Self::PolicePursuit(_) => EventKind::PolicePursuit,
        }
    }

    /// View this payload as a player action, if it is one.
    pub const fn as_player_action(&self) -> Option<PlayerAction> {
        match *self {
            Self::PlayerMove(details) => Some(PlayerAction::Moved(details)),
            Self::PlayerMaskChange(details) => Some(PlayerAction::MaskChanged(details)),
            Self::PlayerMaskRejected(details) => Some(PlayerAction::MaskRejected(details)),
            _ => None,
        }
    }
}

/// A player action forwarded by the coordinator to interested systems.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum PlayerAction {
    /// The player moved.
    Moved(PlayerMoveDetails),
    /// The player's mask changed.
    MaskChanged(MaskChangeDetails),
    /// A mask request was refused.
    MaskRejected(MaskRejectedDetails),
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A published event: payload plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Unique identifier assigned at publish time.
    pub id: EventId,
    /// Name of the component that published the event.
    pub source: String,
    /// Wall-clock publish time.
    pub timestamp: DateTime<Utc>,
    /// The typed payload.
    pub payload: GameEvent,
}

impl Event {
    /// Wrap a payload with a fresh ID and the current timestamp.
    pub fn new(payload: GameEvent, source: &str) -> Self {
        Self {
            id: EventId::new(),
            source: source.to_owned(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// The kind tag of the payload.
    pub const fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_dotted() {
        for kind in EventKind::ALL {
            assert!(kind.as_str().contains('.'), "{kind:?} has no namespace");
        }
        assert_eq!(EventKind::GameOver.to_string(), "game.over");
    }

    #[test]
    fn serde_kind_matches_as_str() {
        for kind in EventKind::ALL {
            let json = serde_json::to_string(&kind).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn payload_kind_matches_tag() {
        let event = Event::new(
            GameEvent::GameOutrageChange(MeterChangeDetails {
                previous: 10.0,
                current: 25.0,
            }),
            "test",
        );
        assert_eq!(event.kind(), EventKind::GameOutrageChange);

        let json = serde_json::to_value(&event.payload).unwrap_or_default();
        assert_eq!(
            json.get("type").and_then(serde_json::Value::as_str),
            Some("game.outrage_change")
        );
    }

    #[test]
    fn player_actions_are_recognised() {
        let moved = GameEvent::PlayerMove(PlayerMoveDetails {
            position: Vec3::Y,
            direction: Vec3::X,
            distance: 0.1,
        });
        assert!(moved.kind().is_player_action());
        assert!(matches!(
            moved.as_player_action(),
            Some(PlayerAction::Moved(_))
        ));
        assert!(GameEvent::GameRestart.as_player_action().is_none());
    }

    #[test]
    fn meter_delta_reflects_clamping() {
        let change = MeterChangeDetails {
            previous: 95.0,
            current: 100.0,
        };
        assert!((change.delta() - 5.0).abs() < f32::EPSILON);
        assert!(!change.is_depleted());
    }
}
