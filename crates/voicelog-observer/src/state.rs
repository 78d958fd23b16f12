//! Shared application state for the Observer API server.
//!
//! [`AppState`] wraps the [`Recorder`], which already synchronizes its own
//! reads and writes. Queries never block ingestion for longer than a read
//! lock on the log and the cache.

use std::sync::Arc;

use voicelog_core::Recorder;

/// Shared state injected into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The ingestion and query entry point.
    pub recorder: Arc<Recorder>,
}

impl AppState {
    /// Create state around an existing recorder.
    pub const fn new(recorder: Arc<Recorder>) -> Self {
        Self { recorder }
    }
}
