//! Core structs for the Voicelog pipeline.
//!
//! Covers the transient upstream snapshot, the persisted log event, the
//! denormalized entity snapshots kept in the cache, and the observation
//! config. Every persisted struct round-trips through `serde_json` without
//! losing a field.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Attribute, ChangeFlag, EntityKind, MoveKind};
use crate::ids::{GroupId, ParticipantId, RoomId};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The six boolean attributes of a participant at one instant.
///
/// Fields missing from an upstream payload decode as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Attributes {
    /// Microphone muted by the participant.
    pub self_muted: bool,
    /// Output deafened by the participant.
    pub self_deafened: bool,
    /// Muted by a group moderator.
    pub group_muted: bool,
    /// Deafened by a group moderator.
    pub group_deafened: bool,
    /// Screen stream active.
    pub streaming: bool,
    /// Camera active.
    pub video_enabled: bool,
}

impl Attributes {
    /// Read a single attribute by name.
    pub const fn get(&self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::SelfMuted => self.self_muted,
            Attribute::SelfDeafened => self.self_deafened,
            Attribute::GroupMuted => self.group_muted,
            Attribute::GroupDeafened => self.group_deafened,
            Attribute::Streaming => self.streaming,
            Attribute::VideoEnabled => self.video_enabled,
        }
    }
}

/// The full session state of one participant as reported by the upstream
/// source. Transient: never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionStateSnapshot {
    /// The participant this snapshot describes.
    pub participant_id: ParticipantId,
    /// The group the participant's room belongs to.
    pub group_id: GroupId,
    /// Room the participant is in now, if any.
    #[serde(default)]
    pub room_id: Option<RoomId>,
    /// Room the participant was in before this update, if any.
    #[serde(default)]
    pub previous_room_id: Option<RoomId>,
    /// Boolean attribute set.
    #[serde(default)]
    pub attributes: Attributes,
}

// ---------------------------------------------------------------------------
// Log event
// ---------------------------------------------------------------------------

/// A classified, persisted record of one snapshot transition.
///
/// The log stores these newest-first; `at` never increases walking from
/// the head of the log towards the tail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LogEvent {
    /// The participant whose state changed.
    pub participant_id: ParticipantId,
    /// The group the event happened in.
    pub group_id: GroupId,
    /// Room after the transition, if any.
    pub room_id: Option<RoomId>,
    /// Room before the transition, if any.
    pub previous_room_id: Option<RoomId>,
    /// Attribute flips relative to the previously tracked snapshot.
    pub changes: Vec<ChangeFlag>,
    /// How the participant's room changed.
    pub move_kind: MoveKind,
    /// Attributes true at snapshot time.
    pub active: Vec<Attribute>,
    /// Wall-clock milliseconds since the Unix epoch.
    #[ts(type = "number")]
    pub at: i64,
}

impl LogEvent {
    /// Whether this event references `room` as either its current or
    /// previous room.
    pub fn touches_room(&self, room: &RoomId) -> bool {
        self.room_id.as_ref() == Some(room) || self.previous_room_id.as_ref() == Some(room)
    }
}

// ---------------------------------------------------------------------------
// Entity snapshots
// ---------------------------------------------------------------------------

/// Denormalized participant metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ParticipantInfo {
    /// Participant id.
    pub id: ParticipantId,
    /// Unique account name.
    pub username: String,
    /// Optional display name shown instead of the username.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar asset reference.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Whether the account is automated.
    #[serde(default)]
    pub bot: bool,
    /// Legacy numeric discriminator, `"0"` when unused.
    #[serde(default)]
    pub discriminator: String,
}

/// Denormalized group metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GroupInfo {
    /// Group id.
    pub id: GroupId,
    /// Group name.
    pub name: String,
    /// Icon asset reference.
    #[serde(default)]
    pub icon: Option<String>,
    /// Owning participant, if known.
    #[serde(default)]
    pub owner_id: Option<ParticipantId>,
}

/// Denormalized room metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoomInfo {
    /// Room id.
    pub id: RoomId,
    /// Room name.
    pub name: String,
    /// Upstream numeric room type.
    #[serde(default)]
    pub kind: u32,
    /// Group the room belongs to.
    pub group_id: GroupId,
}

/// Any one of the three cached entity forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "kind", content = "info", rename_all = "lowercase")]
pub enum EntitySnapshot {
    /// A participant.
    Participant(ParticipantInfo),
    /// A group.
    Group(GroupInfo),
    /// A room.
    Room(RoomInfo),
}

impl EntitySnapshot {
    /// The kind of entity this snapshot describes.
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Participant(_) => EntityKind::Participant,
            Self::Group(_) => EntityKind::Group,
            Self::Room(_) => EntityKind::Room,
        }
    }

    /// The raw id of the described entity.
    pub fn id(&self) -> &str {
        match self {
            Self::Participant(p) => p.id.as_str(),
            Self::Group(g) => g.id.as_str(),
            Self::Room(r) => r.id.as_str(),
        }
    }
}

// ---------------------------------------------------------------------------
// Query projection
// ---------------------------------------------------------------------------

/// A log event with its referenced entities resolved, live first and
/// cached second. Any entity that resolves nowhere is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EnrichedLogEvent {
    /// The underlying log record.
    #[serde(flatten)]
    pub event: LogEvent,
    /// Resolved participant.
    pub participant: Option<ParticipantInfo>,
    /// Resolved group.
    pub group: Option<GroupInfo>,
    /// Resolved current room.
    pub room: Option<RoomInfo>,
    /// Resolved previous room.
    pub previous_room: Option<RoomInfo>,
}

// ---------------------------------------------------------------------------
// Observation config
// ---------------------------------------------------------------------------

/// Which groups are observed and which rooms are carved out of observation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ObservationConfig {
    /// Groups whose participants are tracked and logged.
    #[serde(default)]
    pub observed_groups: BTreeSet<GroupId>,
    /// Rooms suppressed from tracking and logging regardless of group.
    #[serde(default)]
    pub excluded_rooms: BTreeSet<RoomId>,
}

impl ObservationConfig {
    /// Whether `group` is under observation.
    pub fn is_observed(&self, group: &GroupId) -> bool {
        self.observed_groups.contains(group)
    }

    /// Whether `room` is excluded from observation.
    pub fn is_excluded(&self, room: &RoomId) -> bool {
        self.excluded_rooms.contains(room)
    }
}
