//! Denormalized entity metadata retained for log enrichment.
//!
//! The cache is trailing and opportunistic: entries are written whenever a
//! logged event references a resolvable entity and removed by garbage
//! collection once nothing in the log references them. Live upstream
//! resolution always takes precedence at query time.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use voicelog_types::{
    EntityKind, EntitySnapshot, GroupId, GroupInfo, LogEvent, ParticipantId, ParticipantInfo,
    RoomId, RoomInfo,
};

use crate::codec;
use crate::error::StoreError;

/// Persisted form of a single cache kind: id -> info.
pub type CacheMap<K, V> = BTreeMap<K, V>;

/// Number of entries removed per kind by one GC pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcReport {
    /// Participant entries removed.
    pub participants: usize,
    /// Group entries removed.
    pub groups: usize,
    /// Room entries removed.
    pub rooms: usize,
}

impl GcReport {
    /// Total entries removed across all kinds.
    pub const fn total(&self) -> usize {
        self.participants
            .saturating_add(self.groups)
            .saturating_add(self.rooms)
    }
}

/// Per-kind entry counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSizes {
    /// Cached participants.
    pub participants: usize,
    /// Cached groups.
    pub groups: usize,
    /// Cached rooms.
    pub rooms: usize,
}

/// Ids referenced by a log, per kind.
#[derive(Debug, Clone, Default)]
pub struct References {
    participants: BTreeSet<ParticipantId>,
    groups: BTreeSet<GroupId>,
    rooms: BTreeSet<RoomId>,
}

impl References {
    /// Collect every id referenced by `log`. Rooms count whether they
    /// appear as the current or the previous room.
    pub fn from_log(log: &[LogEvent]) -> Self {
        let mut refs = Self::default();
        for event in log {
            refs.participants.insert(event.participant_id.clone());
            refs.groups.insert(event.group_id.clone());
            if let Some(room) = &event.room_id {
                refs.rooms.insert(room.clone());
            }
            if let Some(room) = &event.previous_room_id {
                refs.rooms.insert(room.clone());
            }
        }
        refs
    }
}

/// Cache of participant, group, and room metadata.
#[derive(Debug, Clone, Default)]
pub struct EntityCache {
    participants: CacheMap<ParticipantId, ParticipantInfo>,
    groups: CacheMap<GroupId, GroupInfo>,
    rooms: CacheMap<RoomId, RoomInfo>,
}

impl EntityCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cache from its three persisted maps.
    pub fn from_maps(
        participants: CacheMap<ParticipantId, ParticipantInfo>,
        groups: CacheMap<GroupId, GroupInfo>,
        rooms: CacheMap<RoomId, RoomInfo>,
    ) -> Self {
        Self {
            participants,
            groups,
            rooms,
        }
    }

    /// Upsert an entity keyed by its kind and id.
    pub fn put(&mut self, snapshot: EntitySnapshot) {
        match snapshot {
            EntitySnapshot::Participant(info) => {
                self.participants.insert(info.id.clone(), info);
            }
            EntitySnapshot::Group(info) => {
                self.groups.insert(info.id.clone(), info);
            }
            EntitySnapshot::Room(info) => {
                self.rooms.insert(info.id.clone(), info);
            }
        }
    }

    /// Look up an entity by kind and raw id.
    pub fn get(&self, kind: EntityKind, id: &str) -> Option<EntitySnapshot> {
        match kind {
            EntityKind::Participant => self
                .participant(&ParticipantId::new(id))
                .cloned()
                .map(EntitySnapshot::Participant),
            EntityKind::Group => self
                .group(&GroupId::new(id))
                .cloned()
                .map(EntitySnapshot::Group),
            EntityKind::Room => self
                .room(&RoomId::new(id))
                .cloned()
                .map(EntitySnapshot::Room),
        }
    }

    /// Cached participant metadata.
    pub fn participant(&self, id: &ParticipantId) -> Option<&ParticipantInfo> {
        self.participants.get(id)
    }

    /// Cached group metadata.
    pub fn group(&self, id: &GroupId) -> Option<&GroupInfo> {
        self.groups.get(id)
    }

    /// Cached room metadata.
    pub fn room(&self, id: &RoomId) -> Option<&RoomInfo> {
        self.rooms.get(id)
    }

    /// Entry counts per kind.
    pub fn sizes(&self) -> CacheSizes {
        CacheSizes {
            participants: self.participants.len(),
            groups: self.groups.len(),
            rooms: self.rooms.len(),
        }
    }

    /// Drop every entry not in `refs`.
    pub fn retain_referenced(&mut self, refs: &References) -> GcReport {
        fn prune<K: Ord, V>(map: &mut CacheMap<K, V>, keep: &BTreeSet<K>) -> usize {
            let before = map.len();
            map.retain(|k, _| keep.contains(k));
            before.saturating_sub(map.len())
        }
        GcReport {
            participants: prune(&mut self.participants, &refs.participants),
            groups: prune(&mut self.groups, &refs.groups),
            rooms: prune(&mut self.rooms, &refs.rooms),
        }
    }

    /// Remove every entry the given log no longer references. Idempotent.
    pub fn garbage_collect(&mut self, live_log: &[LogEvent]) -> GcReport {
        self.retain_referenced(&References::from_log(live_log))
    }

    /// Encode the participant map.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if encoding fails.
    pub fn encode_participants(&self) -> Result<String, StoreError> {
        codec::encode(&self.participants)
    }

    /// Encode the group map.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if encoding fails.
    pub fn encode_groups(&self) -> Result<String, StoreError> {
        codec::encode(&self.groups)
    }

    /// Encode the room map.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if encoding fails.
    pub fn encode_rooms(&self) -> Result<String, StoreError> {
        codec::encode(&self.rooms)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use voicelog_types::MoveKind;

    use super::*;

    fn participant(id: &str) -> EntitySnapshot {
        EntitySnapshot::Participant(ParticipantInfo {
            id: ParticipantId::new(id),
            username: format!("user-{id}"),
            display_name: None,
            avatar: None,
            bot: false,
            discriminator: String::from("0"),
        })
    }

    fn group(id: &str) -> EntitySnapshot {
        EntitySnapshot::Group(GroupInfo {
            id: GroupId::new(id),
            name: format!("group-{id}"),
            icon: None,
            owner_id: None,
        })
    }

    fn room(id: &str) -> EntitySnapshot {
        EntitySnapshot::Room(RoomInfo {
            id: RoomId::new(id),
            name: format!("room-{id}"),
            kind: 2,
            group_id: GroupId::new("g1"),
        })
    }

    fn event(p: &str, room: Option<&str>, previous: Option<&str>) -> LogEvent {
        LogEvent {
            participant_id: ParticipantId::new(p),
            group_id: GroupId::new("g1"),
            room_id: room.map(RoomId::new),
            previous_room_id: previous.map(RoomId::new),
            changes: Vec::new(),
            move_kind: MoveKind::Move,
            active: Vec::new(),
            at: 1,
        }
    }

    #[test]
    fn put_then_get_by_kind() {
        let mut cache = EntityCache::new();
        cache.put(participant("p1"));
        cache.put(room("r1"));
        assert_eq!(cache.get(EntityKind::Participant, "p1"), Some(participant("p1")));
        assert_eq!(cache.get(EntityKind::Room, "r1"), Some(room("r1")));
        assert_eq!(cache.get(EntityKind::Group, "p1"), None);
    }

    #[test]
    fn put_upserts() {
        let mut cache = EntityCache::new();
        cache.put(participant("p1"));
        let mut renamed = participant("p1");
        if let EntitySnapshot::Participant(info) = &mut renamed {
            info.username = String::from("renamed");
        }
        cache.put(renamed);
        assert_eq!(
            cache
                .participant(&ParticipantId::new("p1"))
                .map(|p| p.username.as_str()),
            Some("renamed")
        );
        assert_eq!(cache.sizes().participants, 1);
    }

    #[test]
    fn gc_removes_unreferenced_and_is_idempotent() {
        let mut cache = EntityCache::new();
        for snap in [
            participant("p1"),
            participant("p2"),
            group("g1"),
            group("g2"),
            room("r1"),
            room("r2"),
            room("r3"),
        ] {
            cache.put(snap);
        }
        let log = vec![event("p1", Some("r1"), Some("r2"))];

        let report = cache.garbage_collect(&log);
        assert_eq!(
            report,
            GcReport {
                participants: 1,
                groups: 1,
                rooms: 1
            }
        );
        assert_eq!(report.total(), 3);
        assert!(cache.room(&RoomId::new("r2")).is_some());
        assert!(cache.room(&RoomId::new("r3")).is_none());

        assert_eq!(cache.garbage_collect(&log), GcReport::default());
    }

    #[test]
    fn retain_keeps_only_referenced_ids() {
        let mut cache = EntityCache::new();
        cache.put(participant("kept"));
        cache.put(participant("dropped"));
        let refs = References::from_log(&[event("kept", Some("r1"), None)]);

        let report = cache.retain_referenced(&refs);
        assert_eq!(report.participants, 1);
        assert!(cache.participant(&ParticipantId::new("kept")).is_some());
        assert!(cache.participant(&ParticipantId::new("dropped")).is_none());
    }

    #[test]
    fn encoded_maps_rebuild_the_cache() {
        let mut cache = EntityCache::new();
        cache.put(participant("p1"));
        cache.put(group("g1"));
        cache.put(room("r1"));

        let participants = codec::decode_or_default(
            "p",
            Some(cache.encode_participants().unwrap().as_str()),
        );
        let groups = codec::decode_or_default("g", Some(cache.encode_groups().unwrap().as_str()));
        let rooms = codec::decode_or_default("r", Some(cache.encode_rooms().unwrap().as_str()));
        let rebuilt = EntityCache::from_maps(participants, groups, rooms);

        assert_eq!(rebuilt.sizes(), cache.sizes());
        assert_eq!(rebuilt.get(EntityKind::Group, "g1"), Some(group("g1")));
    }
}
