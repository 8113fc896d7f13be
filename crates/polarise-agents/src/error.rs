//! Error types for the polarise-agents crate.
//!
//! Agent rules never panic. A refused player request is reported as a typed
//! [`AgentError`]; a collaborator that is unexpectedly borrowed surfaces as a
//! [`SystemError`] so the coordinator can log and isolate it.

use std::cell::BorrowMutError;

use polarise_core::coordinator::SystemError;
use polarise_types::{MaskRejection, MaskType};

/// Errors that can occur during agent operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The player asked for a mask the rules do not allow right now.
    #[error("mask request {requested:?} refused: {reason:?}")]
    MaskRejected {
        /// The requested mask; `None` is neutral.
        requested: Option<MaskType>,
        /// Why it was refused.
        reason: MaskRejection,
    },

    /// The game state was already mutably borrowed.
    #[error("game state is busy: {source}")]
    StateBusy {
        /// The underlying borrow error.
        #[from]
        source: BorrowMutError,
    },

    /// An operation needed `initialize` to have run first.
    #[error("{system} is not initialized")]
    NotInitialized {
        /// The system that was used too early.
        system: &'static str,
    },
}

impl From<AgentError> for SystemError {
    fn from(err: AgentError) -> Self {
        match &err {
            AgentError::NotInitialized { system } => Self::NotInitialized { system: *system },
            AgentError::StateBusy { .. } => Self::ServiceBusy {
                service: "game_state",
            },
            AgentError::MaskRejected { .. } => Self::Failed {
                system: "player",
                reason: err.to_string(),
            },
        }
    }
}
