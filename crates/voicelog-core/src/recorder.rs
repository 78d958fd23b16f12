//! The single-writer ingestion path.
//!
//! A [`Recorder`] ties the tracker, the classifier, and the journal
//! together. Batches are processed one at a time under the tracker mutex;
//! each batch is classified against a tracker transaction, written to the
//! journal as one durable unit, and only then folded into the tracker.
//!
//! # Lock order
//!
//! `tracker` before `observation`. Queries take neither.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use voicelog_db::{CacheSizes, Journal, StoreError, save_observation};
use voicelog_types::{
    EnrichedLogEvent, EntitySnapshot, GroupId, ObservationConfig, RoomId, SessionStateSnapshot,
};

use crate::classify::classify;
use crate::clock::MonotonicClock;
use crate::query::{LogFilter, QueryView};
use crate::tracker::StateTracker;
use crate::upstream::Upstream;

/// Errors surfaced by the recorder.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    /// The durable write failed; in-memory state is unchanged.
    #[error("persistence failed: {0}")]
    Store(#[from] StoreError),
}

/// Point-in-time status of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecorderStatus {
    /// Whether batches are currently ingested.
    pub ingestion_enabled: bool,
    /// Events currently in the log.
    pub log_len: usize,
    /// Log capacity.
    pub max_history_size: usize,
    /// Default query size.
    pub display_limit: usize,
    /// Participants currently tracked.
    pub tracked_participants: usize,
    /// Entity cache sizes.
    pub cache: CacheSizes,
    /// Number of observed groups.
    pub observed_groups: usize,
    /// Number of excluded rooms.
    pub excluded_rooms: usize,
}

/// Ingestion, observation control, and query entry point.
pub struct Recorder {
    journal: Arc<Journal>,
    upstream: Arc<dyn Upstream>,
    tracker: Mutex<StateTracker>,
    observation: RwLock<ObservationConfig>,
    enabled: AtomicBool,
    display_limit: AtomicUsize,
    clock: MonotonicClock,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("enabled", &self.enabled)
            .field("display_limit", &self.display_limit)
            .finish_non_exhaustive()
    }
}

impl Recorder {
    /// Build a recorder. Ingestion starts disabled.
    ///
    /// The clock is seeded from the newest logged event so timestamps stay
    /// ordered across restarts.
    pub async fn new(
        journal: Arc<Journal>,
        upstream: Arc<dyn Upstream>,
        observation: ObservationConfig,
        display_limit: usize,
    ) -> Self {
        let floor = journal.newest_at().await.unwrap_or(0);
        let tracker = StateTracker::with_observed(observation.observed_groups.iter().cloned());
        Self {
            journal,
            upstream,
            tracker: Mutex::new(tracker),
            observation: RwLock::new(observation),
            enabled: AtomicBool::new(false),
            display_limit: AtomicUsize::new(display_limit.max(1)),
            clock: MonotonicClock::new(floor),
        }
    }

    // -----------------------------------------------------------------------
    // Ingestion
    // -----------------------------------------------------------------------

    /// Ingest one ordered batch of snapshots. Returns the number of events
    /// logged.
    ///
    /// Snapshots for groups the tracker does not observe, without a room,
    /// or in an excluded room are skipped. Nothing happens while ingestion is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Store`] if the journal write fails. The
    /// log, the cache, and the tracker are then exactly as before the call.
    pub async fn ingest(&self, batch: &[SessionStateSnapshot]) -> Result<usize, RecorderError> {
        if !self.is_enabled() {
            return Ok(0);
        }
        let mut tracker = self.tracker.lock().await;
        // Re-check: `disable` may have completed while this batch waited.
        if !self.is_enabled() {
            return Ok(0);
        }
        let observation = self.observation.read().await;

        let at = self.clock.now_ms();
        let mut txn = tracker.begin();
        let mut events = Vec::new();
        let mut entities = Vec::new();

        for snapshot in batch {
            if !txn.is_observed(&snapshot.group_id) {
                continue;
            }
            let Some(room) = snapshot
                .room_id
                .as_ref()
                .or(snapshot.previous_room_id.as_ref())
            else {
                continue;
            };
            if observation.is_excluded(room) {
                continue;
            }

            let (prior, _) = txn.diff(snapshot);
            let event = classify(snapshot, prior, at);
            txn.commit(snapshot.clone(), event.move_kind);
            self.collect_entities(snapshot, &mut entities);
            events.push(event);
        }
        drop(observation);

        if events.is_empty() {
            return Ok(0);
        }

        if let Err(e) = self.journal.append(&events, entities).await {
            tracing::warn!(error = %e, batch = batch.len(), "Batch discarded, journal write failed");
            return Err(e.into());
        }
        txn.apply();

        tracing::debug!(
            received = batch.len(),
            recorded = events.len(),
            tracked = tracker.len(),
            "Batch recorded"
        );
        Ok(events.len())
    }

    fn collect_entities(&self, snapshot: &SessionStateSnapshot, out: &mut Vec<EntitySnapshot>) {
        if let Some(p) = self.upstream.resolve_participant(&snapshot.participant_id) {
            out.push(EntitySnapshot::Participant(p));
        }
        if let Some(g) = self.upstream.resolve_group(&snapshot.group_id) {
            out.push(EntitySnapshot::Group(g));
        }
        for room in [&snapshot.room_id, &snapshot.previous_room_id]
            .into_iter()
            .flatten()
        {
            if let Some(r) = self.upstream.resolve_room(room) {
                out.push(EntitySnapshot::Room(r));
            }
        }
    }

    /// Start ingesting batches.
    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::SeqCst) {
            tracing::info!("Ingestion enabled");
        }
    }

    /// Stop ingesting batches. Returns once any in-flight batch has
    /// completed, so no batch is left half-applied.
    pub async fn disable(&self) {
        let was_enabled = self.enabled.swap(false, Ordering::SeqCst);
        let _tracker = self.tracker.lock().await;
        if was_enabled {
            tracing::info!("Ingestion disabled");
        }
    }

    /// Whether batches are currently ingested.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Observation control
    // -----------------------------------------------------------------------

    /// Current observation config.
    pub async fn observation(&self) -> ObservationConfig {
        self.observation.read().await.clone()
    }

    /// Start observing `group`. Returns `false` if it was already observed.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Store`] if persisting the config fails; the
    /// group is then not observed.
    pub async fn observe_group(&self, group: GroupId) -> Result<bool, RecorderError> {
        let mut tracker = self.tracker.lock().await;
        let mut observation = self.observation.write().await;
        if observation.is_observed(&group) {
            return Ok(false);
        }
        let mut next = observation.clone();
        next.observed_groups.insert(group.clone());
        save_observation(self.journal.store().as_ref(), &next).await?;
        *observation = next;
        tracing::info!(group = %group, "Group observed");
        tracker.observe(group);
        Ok(true)
    }

    /// Stop observing `group` and drop its tracked participants. Returns
    /// `false` if it was not observed.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Store`] if persisting the config fails; the
    /// group then stays observed.
    pub async fn unobserve_group(&self, group: &GroupId) -> Result<bool, RecorderError> {
        let mut tracker = self.tracker.lock().await;
        let mut observation = self.observation.write().await;
        if !observation.is_observed(group) {
            return Ok(false);
        }
        let mut next = observation.clone();
        next.observed_groups.remove(group);
        save_observation(self.journal.store().as_ref(), &next).await?;
        *observation = next;
        let dropped = tracker.unobserve(group);
        tracing::info!(group = %group, dropped, "Group unobserved");
        Ok(true)
    }

    /// Exclude `room` from observation. Returns `false` if it was already
    /// excluded.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Store`] if persisting the config fails.
    pub async fn exclude_room(&self, room: RoomId) -> Result<bool, RecorderError> {
        let mut observation = self.observation.write().await;
        if observation.is_excluded(&room) {
            return Ok(false);
        }
        let mut next = observation.clone();
        next.excluded_rooms.insert(room.clone());
        save_observation(self.journal.store().as_ref(), &next).await?;
        *observation = next;
        tracing::info!(room = %room, "Room excluded");
        Ok(true)
    }

    /// Lift the exclusion of `room`. Returns `false` if it was not
    /// excluded.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Store`] if persisting the config fails.
    pub async fn include_room(&self, room: &RoomId) -> Result<bool, RecorderError> {
        let mut observation = self.observation.write().await;
        if !observation.is_excluded(room) {
            return Ok(false);
        }
        let mut next = observation.clone();
        next.excluded_rooms.remove(room);
        save_observation(self.journal.store().as_ref(), &next).await?;
        *observation = next;
        tracing::info!(room = %room, "Room included");
        Ok(true)
    }

    /// Write the current observation config to the store.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Store`] if the write fails.
    pub async fn persist_observation(&self) -> Result<(), RecorderError> {
        let observation = self.observation.read().await;
        save_observation(self.journal.store().as_ref(), &observation).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    /// Change the log capacity. Returns the clamped value. Takes effect on
    /// the next append.
    pub async fn set_max_history(&self, max_len: usize) -> usize {
        let max_len = max_len.max(1);
        self.journal.set_max_len(max_len).await;
        tracing::info!(max_len, "Log capacity changed");
        max_len
    }

    /// Change the default query size. Returns the clamped value.
    pub fn set_display_limit(&self, limit: usize) -> usize {
        let limit = limit.max(1);
        self.display_limit.store(limit, Ordering::SeqCst);
        limit
    }

    /// Default query size.
    pub fn display_limit(&self) -> usize {
        self.display_limit.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Query the log. `limit` defaults to the display limit.
    pub async fn list(&self, filter: &LogFilter, limit: Option<usize>) -> Vec<EnrichedLogEvent> {
        let limit = limit.unwrap_or_else(|| self.display_limit());
        let log = self.journal.read_log().await;
        let cache = self.journal.read_cache().await;
        QueryView::new(&log, &cache, self.upstream.as_ref()).list(filter, limit)
    }

    /// Current pipeline status.
    ///
    /// Briefly waits for an in-flight batch, since the tracked participant
    /// count is read under the tracker lock.
    pub async fn status(&self) -> RecorderStatus {
        let tracked_participants = self.tracker.lock().await.len();
        let (observed_groups, excluded_rooms) = {
            let observation = self.observation.read().await;
            (
                observation.observed_groups.len(),
                observation.excluded_rooms.len(),
            )
        };
        let (log_len, max_history_size) = {
            let log = self.journal.read_log().await;
            (log.len(), log.max_len())
        };
        RecorderStatus {
            ingestion_enabled: self.is_enabled(),
            log_len,
            max_history_size,
            display_limit: self.display_limit(),
            tracked_participants,
            cache: self.journal.read_cache().await.sizes(),
            observed_groups,
            excluded_rooms,
        }
    }

    /// The journal behind this recorder.
    pub const fn journal(&self) -> &Arc<Journal> {
        &self.journal
    }
}
