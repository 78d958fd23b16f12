//! Enumeration types for the Voicelog pipeline.
//!
//! Labels here are part of the persisted log format and of the filter
//! vocabulary the presentation layer sends back, so the serialized names
//! are fixed by `serde` attributes rather than left to variant names.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Transition kind
// ---------------------------------------------------------------------------

/// Classification of a snapshot pair by how the participant's room changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum MoveKind {
    /// Entered a room from nowhere.
    Join,
    /// Left a room for nowhere.
    Leave,
    /// Switched from one room to a different one.
    Move,
    /// Room unchanged (attribute update, or no room on either side).
    Stay,
}

impl MoveKind {
    /// All transition kinds, in display order.
    pub const ALL: [Self; 4] = [Self::Join, Self::Leave, Self::Move, Self::Stay];
}

// ---------------------------------------------------------------------------
// Boolean attributes
// ---------------------------------------------------------------------------

/// One of the six boolean attributes carried by every snapshot.
///
/// When listed on a log event, an attribute means "currently true".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub enum Attribute {
    /// The participant muted their own microphone.
    SelfMuted,
    /// The participant deafened their own output.
    SelfDeafened,
    /// A group moderator muted the participant.
    GroupMuted,
    /// A group moderator deafened the participant.
    GroupDeafened,
    /// The participant is streaming their screen.
    Streaming,
    /// The participant's camera is on.
    VideoEnabled,
}

impl Attribute {
    /// All attributes, in the canonical order used for flag lists.
    pub const ALL: [Self; 6] = [
        Self::SelfMuted,
        Self::SelfDeafened,
        Self::GroupMuted,
        Self::GroupDeafened,
        Self::Streaming,
        Self::VideoEnabled,
    ];
}

// ---------------------------------------------------------------------------
// Change flags
// ---------------------------------------------------------------------------

/// A labeled flip of one boolean attribute between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "kebab-case")]
pub enum ChangeFlag {
    /// `selfMuted` went false -> true.
    SelfMuteOn,
    /// `selfMuted` went true -> false.
    SelfMuteOff,
    /// `selfDeafened` went false -> true.
    SelfDeafOn,
    /// `selfDeafened` went true -> false.
    SelfDeafOff,
    /// `groupMuted` went false -> true.
    GroupMuteOn,
    /// `groupMuted` went true -> false.
    GroupMuteOff,
    /// `groupDeafened` went false -> true.
    GroupDeafOn,
    /// `groupDeafened` went true -> false.
    GroupDeafOff,
    /// `streaming` went false -> true.
    StreamOn,
    /// `streaming` went true -> false.
    StreamOff,
    /// `videoEnabled` went false -> true.
    VideoOn,
    /// `videoEnabled` went true -> false.
    VideoOff,
}

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// The three kinds of upstream entity a log event references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A participant (user).
    Participant,
    /// A group (collection of rooms).
    Group,
    /// A room.
    Room,
}

impl EntityKind {
    /// Lower-case label used in subjects and log fields.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Group => "group",
            Self::Room => "room",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

impl core::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "participant" => Ok(Self::Participant),
            "group" => Ok(Self::Group),
            "room" => Ok(Self::Room),
            other => Err(format!("unknown entity kind: {other}")),
        }
    }
}
