//! Game state, wiring, and the frame loop for the Polarise simulation.
//!
//! This crate owns everything between the event bus and the agents: the
//! configuration, the service registry systems resolve their collaborators
//! from, the game-state machine, the coordinator that drives systems each
//! frame, and the headless session loop.
//!
//! # Modules
//!
//! - [`clock`] -- Frame clock with a render lane and fixed simulation steps.
//! - [`config`] -- Configuration loading from `polarise-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- [`SessionControl`] shared with the host (pause, stop,
//!   time scale).
//! - [`coordinator`] -- [`GameSystem`] trait and [`SystemCoordinator`].
//! - [`game_state`] -- Meters, crowd flags, win conditions, and score.
//! - [`input`] -- [`InputSource`] trait, idle and scripted sources.
//! - [`registry`] -- String-keyed [`ServiceRegistry`].
//! - [`runner`] -- [`run_session`] loop with limits and auto-restart.
//! - [`scene`] -- [`SceneHooks`] collaborator and [`HeadlessScene`].
//!
//! [`SessionControl`]: control::SessionControl
//! [`GameSystem`]: coordinator::GameSystem
//! [`SystemCoordinator`]: coordinator::SystemCoordinator
//! [`InputSource`]: input::InputSource
//! [`ServiceRegistry`]: registry::ServiceRegistry
//! [`run_session`]: runner::run_session
//! [`SceneHooks`]: scene::SceneHooks
//! [`HeadlessScene`]: scene::HeadlessScene

pub mod clock;
pub mod config;
pub mod control;
pub mod coordinator;
pub mod game_state;
pub mod input;
pub mod registry;
pub mod runner;
pub mod scene;
