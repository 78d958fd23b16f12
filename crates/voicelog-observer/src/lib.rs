//! Observer API server for the Voicelog pipeline.
//!
//! This crate provides an Axum HTTP server that the presentation layer
//! pulls from. It exposes:
//!
//! - **Query endpoints** for the enriched, filtered event log and the
//!   pipeline status
//! - **Observation endpoints** for managing observed groups and excluded
//!   rooms
//! - **Operator endpoints** for toggling ingestion and changing the log
//!   capacity and display limit
//!
//! # Architecture
//!
//! Every handler goes through the shared [`Recorder`]. Queries take read
//! locks only; mutations persist the change before applying it and report
//! a persistence failure as `503` with nothing applied.
//!
//! [`Recorder`]: voicelog_core::Recorder

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{ObserverHandle, StartupError, spawn_observer};
pub use state::AppState;
