//! Data layer for the Voicelog pipeline.
//!
//! The pipeline keeps its event log and entity caches in memory and mirrors
//! them into a string key-value store. `Dragonfly` is the production
//! backend; [`MemoryStore`] stands in for tests and store-less runs.
//!
//! # Architecture
//!
//! ```text
//! Recorder batch
//!     |
//!     +-- Journal::append ------> stage LogStore + EntityCache
//!     |                             |
//!     |                             +-- set_many (log + 3 caches) --> KeyValueStore
//!     |                             +-- commit in memory on success
//!     |
//!     +-- Journal::collect_garbage --> prune EntityCache, set_many (3 caches)
//! ```
//!
//! # Modules
//!
//! - [`kv`] -- `KeyValueStore` trait and the in-memory backend
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) backend
//! - [`keys`] -- Key schema
//! - [`codec`] -- Lenient JSON encoding of stored blobs
//! - [`log_store`] -- Capped newest-first event log
//! - [`entity_cache`] -- Participant / group / room metadata cache with GC
//! - [`journal`] -- Durable owner of the log and the cache
//! - [`observation`] -- Observation config persistence
//! - [`error`] -- Shared error types

pub mod codec;
pub mod dragonfly;
pub mod entity_cache;
pub mod error;
pub mod journal;
pub mod keys;
pub mod kv;
pub mod log_store;
pub mod observation;

// Re-export primary types for convenience.
pub use dragonfly::DragonflyStore;
pub use entity_cache::{CacheSizes, EntityCache, GcReport, References};
pub use error::StoreError;
pub use journal::Journal;
pub use kv::{KeyValueStore, MemoryStore};
pub use log_store::{DEFAULT_MAX_LEN, LogStore};
pub use observation::{load_observation, save_observation};
