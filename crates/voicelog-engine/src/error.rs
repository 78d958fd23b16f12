//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during start-up and shutdown so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: voicelog_core::config::ConfigError,
    },

    /// The key-value store could not be reached or loaded.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: voicelog_db::StoreError,
    },

    /// Persisting recorder state failed.
    #[error("recorder error: {source}")]
    Recorder {
        /// The underlying recorder error.
        #[from]
        source: voicelog_core::RecorderError,
    },

    /// NATS connection or subscription failed.
    #[error("NATS error: {message}")]
    Nats {
        /// Description of the NATS failure.
        message: String,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: voicelog_observer::StartupError,
    },
}
