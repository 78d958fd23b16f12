//! Last-known session state per participant.
//!
//! The tracker is the diff baseline for classification. It holds at most
//! one snapshot per participant, only for groups under observation, and
//! forgets a participant on `Leave`. It does no locking of its own: the
//! recorder holds it behind a mutex for the whole of each batch.

use std::collections::{BTreeSet, HashMap};

use voicelog_types::{GroupId, MoveKind, ParticipantId, SessionStateSnapshot};

/// Per-participant state store.
#[derive(Debug, Default)]
pub struct StateTracker {
    observed: BTreeSet<GroupId>,
    states: HashMap<ParticipantId, SessionStateSnapshot>,
}

impl StateTracker {
    /// Create a tracker observing no groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker observing the given groups.
    pub fn with_observed<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = GroupId>,
    {
        Self {
            observed: groups.into_iter().collect(),
            states: HashMap::new(),
        }
    }

    /// Start tracking `group`. No state is back-filled: participants
    /// already in the group's rooms are first seen on their next update.
    ///
    /// Returns `false` if the group was already observed.
    pub fn observe(&mut self, group: GroupId) -> bool {
        self.observed.insert(group)
    }

    /// Stop tracking `group` and discard every tracked snapshot attributed
    /// to it. Returns the number of discarded entries.
    pub fn unobserve(&mut self, group: &GroupId) -> usize {
        self.observed.remove(group);
        let before = self.states.len();
        self.states.retain(|_, s| &s.group_id != group);
        before.saturating_sub(self.states.len())
    }

    /// Whether `group` is tracked.
    pub fn is_observed(&self, group: &GroupId) -> bool {
        self.observed.contains(group)
    }

    /// The prior snapshot for the snapshot's participant, and whether the
    /// participant is new to the tracker.
    pub fn diff(&self, snapshot: &SessionStateSnapshot) -> (Option<&SessionStateSnapshot>, bool) {
        let prior = self.states.get(&snapshot.participant_id);
        (prior, prior.is_none())
    }

    /// Record `snapshot` as the participant's state. A `Leave` removes the
    /// entry instead.
    pub fn commit(&mut self, snapshot: SessionStateSnapshot, kind: MoveKind) {
        if kind == MoveKind::Leave {
            self.states.remove(&snapshot.participant_id);
        } else {
            self.states
                .insert(snapshot.participant_id.clone(), snapshot);
        }
    }

    /// Tracked snapshot for a participant.
    pub fn get(&self, participant: &ParticipantId) -> Option<&SessionStateSnapshot> {
        self.states.get(participant)
    }

    /// Number of tracked participants.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no participant is tracked.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Open a staging transaction. Nothing reaches the tracker until
    /// [`TrackerTxn::apply`].
    pub fn begin(&mut self) -> TrackerTxn<'_> {
        TrackerTxn {
            tracker: self,
            staged: HashMap::new(),
        }
    }
}

/// Staged tracker commits for one batch.
///
/// `diff` sees commits staged earlier in the same transaction, so repeated
/// updates for one participant within a batch chain correctly. Dropping
/// the transaction discards every staged commit.
#[derive(Debug)]
pub struct TrackerTxn<'a> {
    tracker: &'a mut StateTracker,
    // `None` marks a staged removal.
    staged: HashMap<ParticipantId, Option<SessionStateSnapshot>>,
}

impl TrackerTxn<'_> {
    /// Whether `group` is tracked. Snapshots from other groups must not be
    /// diffed or committed.
    pub fn is_observed(&self, group: &GroupId) -> bool {
        self.tracker.is_observed(group)
    }

    /// Like [`StateTracker::diff`], seeing staged commits first.
    pub fn diff(&self, snapshot: &SessionStateSnapshot) -> (Option<&SessionStateSnapshot>, bool) {
        match self.staged.get(&snapshot.participant_id) {
            Some(staged) => (staged.as_ref(), staged.is_none()),
            None => self.tracker.diff(snapshot),
        }
    }

    /// Stage a commit with [`StateTracker::commit`] semantics.
    pub fn commit(&mut self, snapshot: SessionStateSnapshot, kind: MoveKind) {
        let participant = snapshot.participant_id.clone();
        let entry = (kind != MoveKind::Leave).then_some(snapshot);
        self.staged.insert(participant, entry);
    }

    /// Number of participants with a staged commit.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Fold every staged commit into the tracker.
    pub fn apply(self) {
        for (participant, entry) in self.staged {
            match entry {
                Some(snapshot) => {
                    self.tracker.states.insert(participant, snapshot);
                }
                None => {
                    self.tracker.states.remove(&participant);
                }
            }
        }
    }
}
