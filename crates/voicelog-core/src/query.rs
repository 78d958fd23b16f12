//! Filtered, searchable, size-limited reads over the event log.
//!
//! A [`QueryView`] borrows the log and the entity cache for the duration of
//! one query and enriches matching events with live metadata first and
//! cached metadata second.

use std::collections::BTreeSet;

use voicelog_db::{EntityCache, LogStore};
use voicelog_types::{
    Attribute, ChangeFlag, EnrichedLogEvent, GroupInfo, LogEvent, MoveKind, ParticipantInfo,
    RoomId, RoomInfo,
};

use crate::upstream::Upstream;

/// Query filter.
///
/// The three kind sets are combined with OR; all three empty means no kind
/// filtering. `search` is matched after trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Free-text search: a raw id, or a case-insensitive name fragment.
    pub search: String,
    /// Transition kinds to include.
    pub moves: BTreeSet<MoveKind>,
    /// Change flags to include.
    pub changes: BTreeSet<ChangeFlag>,
    /// Active attributes to include.
    pub active: BTreeSet<Attribute>,
}

impl LogFilter {
    /// Whether the kind sets let `event` through.
    pub fn matches_kinds(&self, event: &LogEvent) -> bool {
        if self.moves.is_empty() && self.changes.is_empty() && self.active.is_empty() {
            return true;
        }
        self.moves.contains(&event.move_kind)
            || event.changes.iter().any(|c| self.changes.contains(c))
            || event.active.iter().any(|a| self.active.contains(a))
    }

    /// Whether `search` matches the enriched event.
    ///
    /// Ids are compared verbatim against the trimmed text; names are
    /// compared case-insensitively as substrings.
    pub fn matches_search(&self, enriched: &EnrichedLogEvent) -> bool {
        let needle = self.search.trim();
        if needle.is_empty() {
            return true;
        }

        let event = &enriched.event;
        let id_hit = event.participant_id.as_str() == needle
            || event.group_id.as_str() == needle
            || event.room_id.as_ref().is_some_and(|r| r.as_str() == needle)
            || event
                .previous_room_id
                .as_ref()
                .is_some_and(|r| r.as_str() == needle);
        if id_hit {
            return true;
        }

        let needle = needle.to_lowercase();
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);
        enriched.participant.as_ref().is_some_and(|p| {
            contains(p.username.as_str()) || p.display_name.as_deref().is_some_and(contains)
        }) || enriched.room.as_ref().is_some_and(|r| contains(r.name.as_str()))
            || enriched.previous_room.as_ref().is_some_and(|r| contains(r.name.as_str()))
            || enriched.group.as_ref().is_some_and(|g| contains(g.name.as_str()))
    }
}

/// Read-only view over a log and its entity cache.
pub struct QueryView<'a> {
    log: &'a LogStore,
    cache: &'a EntityCache,
    upstream: &'a dyn Upstream,
}

impl<'a> QueryView<'a> {
    /// Build a view.
    pub const fn new(log: &'a LogStore, cache: &'a EntityCache, upstream: &'a dyn Upstream) -> Self {
        Self {
            log,
            cache,
            upstream,
        }
    }

    /// Up to `limit` (at least 1) enriched events passing `filter`,
    /// newest-first.
    pub fn list(&self, filter: &LogFilter, limit: usize) -> Vec<EnrichedLogEvent> {
        self.log
            .all()
            .iter()
            .filter(|e| filter.matches_kinds(e))
            .map(|e| self.enrich(e))
            .filter(|e| filter.matches_search(e))
            .take(limit.max(1))
            .collect()
    }

    /// Attach resolved metadata to `event`.
    pub fn enrich(&self, event: &LogEvent) -> EnrichedLogEvent {
        EnrichedLogEvent {
            event: event.clone(),
            participant: self.participant(event),
            group: self.group(event),
            room: event.room_id.as_ref().and_then(|r| self.room(r)),
            previous_room: event.previous_room_id.as_ref().and_then(|r| self.room(r)),
        }
    }

    fn participant(&self, event: &LogEvent) -> Option<ParticipantInfo> {
        self.upstream
            .resolve_participant(&event.participant_id)
            .or_else(|| self.cache.participant(&event.participant_id).cloned())
    }

    fn group(&self, event: &LogEvent) -> Option<GroupInfo> {
        self.upstream
            .resolve_group(&event.group_id)
            .or_else(|| self.cache.group(&event.group_id).cloned())
    }

    fn room(&self, id: &RoomId) -> Option<RoomInfo> {
        self.upstream
            .resolve_room(id)
            .or_else(|| self.cache.room(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use voicelog_types::{EntitySnapshot, GroupId, ParticipantId};

    use super::*;
    use crate::upstream::{Directory, NoUpstream};

    fn event(
        participant: &str,
        room: Option<&str>,
        previous: Option<&str>,
        move_kind: MoveKind,
        at: i64,
    ) -> LogEvent {
        LogEvent {
            participant_id: ParticipantId::new(participant),
            group_id: GroupId::new("g1"),
            room_id: room.map(RoomId::new),
            previous_room_id: previous.map(RoomId::new),
            changes: Vec::new(),
            move_kind,
            active: Vec::new(),
            at,
        }
    }

    fn participant(id: &str, username: &str, display: Option<&str>) -> EntitySnapshot {
        EntitySnapshot::Participant(ParticipantInfo {
            id: ParticipantId::new(id),
            username: username.to_owned(),
            display_name: display.map(str::to_owned),
            avatar: None,
            bot: false,
            discriminator: "0".to_owned(),
        })
    }

    fn room(id: &str, name: &str) -> EntitySnapshot {
        EntitySnapshot::Room(RoomInfo {
            id: RoomId::new(id),
            name: name.to_owned(),
            kind: 2,
            group_id: GroupId::new("g1"),
        })
    }

    fn sample_log() -> LogStore {
        let mut log = LogStore::new(16);
        let mut muted = event("p2", Some("r1"), Some("r1"), MoveKind::Stay, 3);
        muted.changes = vec![ChangeFlag::SelfMuteOn];
        muted.active = vec![Attribute::SelfMuted];
        for entry in [
            event("p1", Some("r1"), None, MoveKind::Join, 1),
            event("p2", Some("r2"), Some("r1"), MoveKind::Move, 2),
            muted,
            event("p1", None, Some("r1"), MoveKind::Leave, 4),
        ] {
            log.append(&[entry]);
        }
        log
    }

    fn ats(events: &[EnrichedLogEvent]) -> Vec<i64> {
        events.iter().map(|e| e.event.at).collect()
    }

    #[test]
    fn empty_filter_returns_newest_first() {
        let log = sample_log();
        let cache = EntityCache::new();
        let view = QueryView::new(&log, &cache, &NoUpstream);
        assert_eq!(ats(&view.list(&LogFilter::default(), 10)), vec![4, 3, 2, 1]);
    }

    #[test]
    fn limit_applies_after_filtering() {
        let log = sample_log();
        let cache = EntityCache::new();
        let view = QueryView::new(&log, &cache, &NoUpstream);
        let filter = LogFilter {
            moves: BTreeSet::from([MoveKind::Join, MoveKind::Move]),
            ..LogFilter::default()
        };
        assert_eq!(ats(&view.list(&filter, 1)), vec![2]);
        assert_eq!(ats(&view.list(&filter, 0)), vec![2]);
    }

    #[test]
    fn kind_sets_combine_with_or() {
        let log = sample_log();
        let cache = EntityCache::new();
        let view = QueryView::new(&log, &cache, &NoUpstream);
        let filter = LogFilter {
            moves: BTreeSet::from([MoveKind::Leave]),
            changes: BTreeSet::from([ChangeFlag::SelfMuteOn]),
            ..LogFilter::default()
        };
        assert_eq!(ats(&view.list(&filter, 10)), vec![4, 3]);

        let by_active = LogFilter {
            active: BTreeSet::from([Attribute::SelfMuted]),
            ..LogFilter::default()
        };
        assert_eq!(ats(&view.list(&by_active, 10)), vec![3]);
    }

    #[test]
    fn search_matches_raw_ids_verbatim() {
        let log = sample_log();
        let cache = EntityCache::new();
        let view = QueryView::new(&log, &cache, &NoUpstream);

        let filter = LogFilter {
            search: "  r2 ".to_owned(),
            ..LogFilter::default()
        };
        assert_eq!(ats(&view.list(&filter, 10)), vec![2]);

        let group = LogFilter {
            search: "g1".to_owned(),
            ..LogFilter::default()
        };
        assert_eq!(view.list(&group, 10).len(), 4);
    }

    #[test]
    fn search_matches_names_case_insensitively() {
        let log = sample_log();
        let mut cache = EntityCache::new();
        cache.put(participant("p1", "alice", Some("Ally")));
        cache.put(participant("p2", "bob", None));
        cache.put(room("r2", "Quiet Corner"));

        let view = QueryView::new(&log, &cache, &NoUpstream);
        let by_display = LogFilter {
            search: "ALL".to_owned(),
            ..LogFilter::default()
        };
        assert_eq!(ats(&view.list(&by_display, 10)), vec![4, 1]);

        let by_room = LogFilter {
            search: "corner".to_owned(),
            ..LogFilter::default()
        };
        assert_eq!(ats(&view.list(&by_room, 10)), vec![2]);
    }

    #[test]
    fn search_matches_previous_room_name() {
        let log = sample_log();
        let mut cache = EntityCache::new();
        cache.put(room("r1", "Lobby"));
        let view = QueryView::new(&log, &cache, &NoUpstream);
        let filter = LogFilter {
            search: "lobby".to_owned(),
            ..LogFilter::default()
        };
        // Every event touches r1 as current or previous room.
        assert_eq!(view.list(&filter, 10).len(), 4);
    }

    #[test]
    fn live_metadata_wins_over_cache() {
        let log = sample_log();
        let mut cache = EntityCache::new();
        cache.put(participant("p1", "stale", None));
        let directory = Directory::new();
        directory.upsert(participant("p1", "fresh", None));

        let view = QueryView::new(&log, &cache, &directory);
        let events = view.list(&LogFilter::default(), 1);
        let name = events
            .first()
            .and_then(|e| e.participant.as_ref())
            .map(|p| p.username.as_str());
        assert_eq!(name, Some("fresh"));
    }

    #[test]
    fn unresolvable_entities_enrich_as_none() {
        let log = sample_log();
        let cache = EntityCache::new();
        let view = QueryView::new(&log, &cache, &NoUpstream);
        let events = view.list(&LogFilter::default(), 10);
        assert!(events.iter().all(|e| e.participant.is_none() && e.group.is_none()));
    }
}
