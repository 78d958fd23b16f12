//! State tracking, classification, ingestion, and queries for the Voicelog
//! pipeline.
//!
//! This crate owns the write path from an upstream snapshot batch to a
//! durable log append, and the read path from a filter to enriched events.
//!
//! # Modules
//!
//! - [`tracker`] -- Last-known session state per participant, with
//!   per-batch staging transactions.
//! - [`classify`] -- Pure transition classification driven by a
//!   declarative attribute table.
//! - [`clock`] -- Monotonic millisecond clock for event timestamps.
//! - [`upstream`] -- [`Upstream`] trait and the in-memory [`Directory`].
//! - [`query`] -- [`LogFilter`] and [`QueryView`].
//! - [`recorder`] -- [`Recorder`], the single-writer ingestion path.
//! - [`gc`] -- Periodic entity cache garbage collection.
//! - [`config`] -- Configuration loading from `voicelog-config.yaml` into
//!   strongly-typed structs.
//!
//! [`Upstream`]: upstream::Upstream
//! [`Directory`]: upstream::Directory
//! [`LogFilter`]: query::LogFilter
//! [`QueryView`]: query::QueryView
//! [`Recorder`]: recorder::Recorder

pub mod classify;
pub mod clock;
pub mod config;
pub mod gc;
pub mod query;
pub mod recorder;
pub mod tracker;
pub mod upstream;

pub use query::{LogFilter, QueryView};
pub use recorder::{Recorder, RecorderError, RecorderStatus};
pub use tracker::{StateTracker, TrackerTxn};
pub use upstream::{Directory, NoUpstream, Upstream};
