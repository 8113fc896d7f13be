//! Shared type definitions for the Polarise simulation.
//!
//! This crate is the single source of truth for the vocabulary used across
//! the Polarise workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the browser HUD.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for events, NPCs, and drones
//! - [`enums`] -- Masks, agent behaviour states, game-over reasons
//! - [`transform`] -- Position/orientation/velocity state of every agent
//! - [`events`] -- The event vocabulary as a tagged union of typed payloads
//! - [`snapshot`] -- Read-only views for the HUD

pub mod enums;
pub mod events;
pub mod ids;
pub mod snapshot;
pub mod transform;

// Re-export all public types at crate root for convenience.
pub use enums::{
    DroneState, GameOverReason, InteractionOutcome, MASK_COUNT, MaskRejection, MaskType,
    NEUTRAL_BACKGROUND_RGB, NpcState,
};
pub use events::{
    CrowdChangeDetails, CrowdUpdateDetails, DroneDetails, Event, EventKind, GameEvent,
    GameOverDetails, MaskChangeDetails, MaskRejectedDetails, MeterChangeDetails,
    NpcInteractionDetails, NpcSpawnDetails, PlayerAction, PlayerMoveDetails,
    PoliceStatusDetails, PursuitDetails, StateChange, SystemDetails, SystemErrorDetails,
};
pub use ids::{DroneId, EventId, NpcId};
pub use snapshot::{GameStateSnapshot, PoliceSnapshot};
pub use transform::{GEOMETRY_EPSILON, Transform};
