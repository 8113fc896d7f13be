//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode during startup and the session loop.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: polarise_core::config::ConfigError,
    },

    /// Frame clock initialization failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: polarise_core::clock::ClockError,
    },

    /// A service could not be resolved while wiring systems.
    #[error("wiring error: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: polarise_core::registry::RegistryError,
    },

    /// One or more systems failed to initialize.
    #[error("systems failed to initialize: {failed}")]
    Initialize {
        /// Rendered list of failing systems.
        failed: String,
    },

    /// The session loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: polarise_core::runner::RunnerError,
    },

    /// The log subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
