//! Live entity resolution.
//!
//! The [`Upstream`] trait is the pipeline's view of the live source:
//! synchronous, non-blocking lookups that may come back empty. The engine
//! feeds a [`Directory`] from upstream entity messages; tests use it
//! directly or fall back to [`NoUpstream`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use voicelog_types::{
    EntityKind, EntitySnapshot, GroupId, GroupInfo, ParticipantId, ParticipantInfo, RoomId,
    RoomInfo,
};

/// Live metadata lookups. A `None` means "not resolvable right now" and is
/// never an error.
pub trait Upstream: Send + Sync {
    /// Resolve live participant metadata.
    fn resolve_participant(&self, id: &ParticipantId) -> Option<ParticipantInfo>;

    /// Resolve live group metadata.
    fn resolve_group(&self, id: &GroupId) -> Option<GroupInfo>;

    /// Resolve live room metadata.
    fn resolve_room(&self, id: &RoomId) -> Option<RoomInfo>;
}

/// An upstream that resolves nothing. Queries then rely on the cache alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUpstream;

impl Upstream for NoUpstream {
    fn resolve_participant(&self, _id: &ParticipantId) -> Option<ParticipantInfo> {
        None
    }

    fn resolve_group(&self, _id: &GroupId) -> Option<GroupInfo> {
        None
    }

    fn resolve_room(&self, _id: &RoomId) -> Option<RoomInfo> {
        None
    }
}

/// In-memory directory of live entities.
#[derive(Debug, Default)]
pub struct Directory {
    participants: RwLock<HashMap<ParticipantId, ParticipantInfo>>,
    groups: RwLock<HashMap<GroupId, GroupInfo>>,
    rooms: RwLock<HashMap<RoomId, RoomInfo>>,
}

impl Directory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entity.
    pub fn upsert(&self, snapshot: EntitySnapshot) {
        match snapshot {
            EntitySnapshot::Participant(info) => {
                self.participants
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(info.id.clone(), info);
            }
            EntitySnapshot::Group(info) => {
                self.groups
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(info.id.clone(), info);
            }
            EntitySnapshot::Room(info) => {
                self.rooms
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(info.id.clone(), info);
            }
        }
    }

    /// Remove an entity. Returns whether it was present.
    pub fn remove(&self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::Participant => self
                .participants
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&ParticipantId::new(id))
                .is_some(),
            EntityKind::Group => self
                .groups
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&GroupId::new(id))
                .is_some(),
            EntityKind::Room => self
                .rooms
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&RoomId::new(id))
                .is_some(),
        }
    }

    /// Number of live entities of `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Participant => self
                .participants
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            EntityKind::Group => self
                .groups
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            EntityKind::Room => self
                .rooms
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
        }
    }
}

impl Upstream for Directory {
    fn resolve_participant(&self, id: &ParticipantId) -> Option<ParticipantInfo> {
        self.participants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn resolve_group(&self, id: &GroupId) -> Option<GroupInfo> {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn resolve_room(&self, id: &RoomId) -> Option<RoomInfo> {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}
