//! Player, NPC flocking, and police agents for the Polarise simulation.
//!
//! Every agent is a [`GameSystem`] driven by the coordinator in
//! `polarise-core`. Agents read and write the shared game state, publish on
//! the event bus, and resolve their collaborators from the service
//! registry. Nothing here touches I/O.
//!
//! # Modules
//!
//! - [`error`] -- Error types for agent operations ([`AgentError`])
//! - [`npc`] -- Mask-group population, flocking, interactions, crowds, and
//!   collisions ([`NpcSystem`])
//! - [`player`] -- Surface-constrained movement and mask rules ([`Player`])
//! - [`police`] -- Outrage-driven drone pursuit ([`PoliceSystem`])
//!
//! [`GameSystem`]: polarise_core::coordinator::GameSystem

pub mod error;
pub mod npc;
pub mod player;
pub mod police;

// Re-export primary types at crate root for convenience.
pub use error::AgentError;
pub use npc::{NpcSystem, SharedNpcSystem};
pub use player::{Player, SharedPlayer};
pub use police::{Drone, PoliceSystem, SharedPolice};
