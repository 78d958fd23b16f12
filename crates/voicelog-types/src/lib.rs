//! Shared type definitions for the Voicelog presence pipeline.
//!
//! This crate is the single source of truth for all types used across the
//! Voicelog workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the presentation layer that renders query results.
//!
//! # Modules
//!
//! - [`ids`] -- String newtypes for participant, group, and room ids
//! - [`enums`] -- Transition kinds, attributes, change flags, entity kinds
//! - [`structs`] -- Snapshots, log events, entity snapshots, observation config

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Attribute, ChangeFlag, EntityKind, MoveKind};
pub use ids::{GroupId, ParticipantId, RoomId};
pub use structs::{
    Attributes, EnrichedLogEvent, EntitySnapshot, GroupInfo, LogEvent, ObservationConfig,
    ParticipantInfo, RoomInfo, SessionStateSnapshot,
};
