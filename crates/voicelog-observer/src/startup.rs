//! Observer server startup helper for embedding in the engine binary.
//!
//! Provides [`spawn_observer`] which binds the Observer HTTP server and
//! runs it on a background Tokio task, so the API serves concurrently with
//! ingestion.
//!
//! # Usage
//!
//! ```rust,ignore
//! use voicelog_observer::{AppState, ServerConfig, spawn_observer};
//! use std::sync::Arc;
//!
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let state = Arc::new(AppState::new(recorder));
//! let observer = spawn_observer(&ServerConfig::default(), state, shutdown_rx).await?;
//! // ...
//! shutdown_tx.send(true)?;
//! observer.handle.await?;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError, bind, start_server};
use crate::state::AppState;

/// Errors that can occur when spawning the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),

    /// The bound listener could not report its address.
    #[error("listener address unavailable: {0}")]
    Address(#[from] std::io::Error),
}

/// A running Observer server.
#[derive(Debug)]
pub struct ObserverHandle {
    /// The address actually bound.
    pub addr: SocketAddr,
    /// The background serving task. Completes after shutdown.
    pub handle: JoinHandle<()>,
}

/// Bind and spawn the Observer HTTP server on a background Tokio task.
///
/// The bind happens before the task is spawned, so a taken port is
/// reported here rather than logged from the background. The server stops
/// gracefully once `shutdown` carries `true` or its sender is dropped.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address does not parse or the
/// bind fails.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<ObserverHandle, StartupError> {
    let listener = bind(config).await?;
    let addr = listener.local_addr()?;

    let stop = async move {
        while !*shutdown.borrow_and_update() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }
    };

    let handle = tokio::spawn(async move {
        if let Err(e) = start_server(listener, state, stop).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(%addr, "Observer server spawned on background task");

    Ok(ObserverHandle { addr, handle })
}
