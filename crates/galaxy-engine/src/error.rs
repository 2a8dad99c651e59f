//! Error types for the Galaxy Events binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the Galaxy Events binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration or catalog loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: galaxy_core::ConfigError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: galaxy_observer::ServerError,
    },

    /// The scheduler task ended while the server was running.
    #[error("scheduler stopped unexpectedly")]
    SchedulerStopped,
}
