//! Capped, newest-first, append-only event log.
//!
//! The log lives in memory; durability is the [`Journal`](crate::Journal)'s
//! job. [`LogStore::staged_append`] computes the next log without mutating
//! so the journal can write it durably before committing.

use voicelog_types::LogEvent;

/// Default maximum number of retained events.
pub const DEFAULT_MAX_LEN: usize = 2048;

/// The in-memory event log.
///
/// Invariants: events are ordered newest-first with non-increasing `at`,
/// and the log never holds more than `max_len` events after an append.
#[derive(Debug, Clone)]
pub struct LogStore {
    events: Vec<LogEvent>,
    max_len: usize,
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEN)
    }
}

impl LogStore {
    /// Create an empty log holding at most `max_len` events (at least 1).
    pub fn new(max_len: usize) -> Self {
        Self {
            events: Vec::new(),
            max_len: max_len.max(1),
        }
    }

    /// Rebuild a log from persisted events.
    ///
    /// The events are stably sorted newest-first and truncated to
    /// `max_len`, so a hand-edited or reordered blob still satisfies the
    /// ordering invariant.
    pub fn from_events(mut events: Vec<LogEvent>, max_len: usize) -> Self {
        let max_len = max_len.max(1);
        events.sort_by(|a, b| b.at.cmp(&a.at));
        events.truncate(max_len);
        Self { events, max_len }
    }

    /// Current capacity.
    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Change the capacity. Clamped to at least 1; the log is trimmed on
    /// the next append, not immediately.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len.max(1);
    }

    /// Number of events held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Compute the log that [`append`](Self::append) would produce, without
    /// mutating. Returns `None` for an empty batch.
    ///
    /// `batch` is in arrival order and keeps that order at the head of the
    /// returned log. Every event of a batch shares one timestamp, so the
    /// newest-first invariant holds.
    pub fn staged_append(&self, batch: &[LogEvent]) -> Option<Vec<LogEvent>> {
        if batch.is_empty() {
            return None;
        }
        let mut next = Vec::with_capacity(batch.len().saturating_add(self.events.len()));
        next.extend(batch.iter().cloned());
        next.extend(self.events.iter().cloned());
        next.truncate(self.max_len);
        Some(next)
    }

    /// Prepend `batch` and trim to capacity. Empty batches are a no-op.
    pub fn append(&mut self, batch: &[LogEvent]) {
        if let Some(next) = self.staged_append(batch) {
            self.events = next;
        }
    }

    /// Replace the whole log with a previously staged one.
    pub fn replace(&mut self, events: Vec<LogEvent>) {
        self.events = events;
    }

    /// Up to `limit` events matching `predicate`, newest-first.
    pub fn query<P>(&self, mut predicate: P, limit: usize) -> Vec<&LogEvent>
    where
        P: FnMut(&LogEvent) -> bool,
    {
        self.events
            .iter()
            .filter(|e| predicate(e))
            .take(limit)
            .collect()
    }

    /// The full log, newest-first.
    pub fn all(&self) -> &[LogEvent] {
        &self.events
    }

    /// Timestamp of the newest event, if any.
    pub fn newest_at(&self) -> Option<i64> {
        self.events.first().map(|e| e.at)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use voicelog_types::{GroupId, MoveKind, ParticipantId, RoomId};

    use super::*;

    fn event(participant: &str, at: i64) -> LogEvent {
        LogEvent {
            participant_id: ParticipantId::new(participant),
            group_id: GroupId::new("g1"),
            room_id: Some(RoomId::new("r1")),
            previous_room_id: None,
            changes: Vec::new(),
            move_kind: MoveKind::Join,
            active: Vec::new(),
            at,
        }
    }

    fn participants(log: &LogStore) -> Vec<&str> {
        log.all().iter().map(|e| e.participant_id.as_str()).collect()
    }

    #[test]
    fn append_puts_batch_at_head_in_arrival_order() {
        let mut log = LogStore::new(10);
        log.append(&[event("a", 1)]);
        log.append(&[event("b", 2), event("c", 2)]);
        assert_eq!(participants(&log), vec!["b", "c", "a"]);
    }

    #[test]
    fn batch_order_survives_at_head() {
        let mut log = LogStore::new(10);
        log.append(&[event("first", 5), event("second", 5), event("third", 5)]);
        assert_eq!(participants(&log), vec!["first", "second", "third"]);
        assert_eq!(log.newest_at(), Some(5));
    }

    #[test]
    fn append_trims_to_capacity() {
        let mut log = LogStore::new(2);
        log.append(&[event("a", 1)]);
        log.append(&[event("b", 2), event("c", 2), event("d", 2)]);
        assert_eq!(participants(&log), vec!["b", "c"]);
    }

    #[test]
    fn empty_batch_is_noop() {
        let mut log = LogStore::new(2);
        log.append(&[event("a", 1)]);
        assert!(log.staged_append(&[]).is_none());
        log.append(&[]);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn capacity_change_applies_on_next_append() {
        let mut log = LogStore::new(5);
        log.append(&[event("a", 1), event("b", 1), event("c", 1)]);
        log.set_max_len(1);
        assert_eq!(log.len(), 3);
        log.append(&[event("d", 4)]);
        assert_eq!(participants(&log), vec!["d"]);
    }

    #[test]
    fn capacity_is_clamped_to_one() {
        let mut log = LogStore::new(0);
        assert_eq!(log.max_len(), 1);
        log.set_max_len(0);
        assert_eq!(log.max_len(), 1);
    }

    #[test]
    fn query_limits_and_filters() {
        let mut log = LogStore::new(10);
        for (participant, at) in [("a", 1), ("b", 2), ("a", 3), ("a", 4)] {
            log.append(&[event(participant, at)]);
        }
        let hits = log.query(|e| e.participant_id.as_str() == "a", 2);
        let ats: Vec<i64> = hits.iter().map(|e| e.at).collect();
        assert_eq!(ats, vec![4, 3]);
    }

    #[test]
    fn staged_append_does_not_mutate() {
        let mut log = LogStore::new(10);
        log.append(&[event("a", 1)]);
        let staged = log.staged_append(&[event("b", 2)]).unwrap();
        assert_eq!(staged.len(), 2);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn from_events_restores_ordering_and_capacity() {
        let log = LogStore::from_events(vec![event("a", 1), event("b", 3), event("c", 2)], 2);
        assert_eq!(participants(&log), vec!["b", "c"]);
        assert_eq!(log.newest_at(), Some(3));
    }
}
