//! Publish/subscribe plumbing for the Polarise simulation.
//!
//! Systems never call each other directly for notifications: they publish a
//! typed [`GameEvent`](polarise_types::GameEvent) on the shared [`EventBus`]
//! and whoever cares subscribes to its [`EventKind`](polarise_types::EventKind).
//!
//! # Modules
//!
//! - [`bus`] -- The bus: delivery, middleware, async queue, history
//! - [`listener`] -- Handler types and subscription handles

pub mod bus;
pub mod listener;

pub use bus::{DEFAULT_HISTORY_LIMIT, EventBus};
pub use listener::{
    AsyncHandler, DEFAULT_PRIORITY, HandlerResult, ListenerId, MiddlewareId, Subscription,
    SyncHandler,
};
