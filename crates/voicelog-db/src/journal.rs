//! Durable owner of the event log and the entity cache.
//!
//! The journal keeps both structures in memory and mirrors them into four
//! store keys. Every mutation is staged first, written with one
//! [`KeyValueStore::set_many`], and committed in memory only after the
//! write succeeds. A failed write leaves the in-memory state untouched.
//!
//! # Locking
//!
//! - `writer` serializes appends and GC passes. A pass collects the log's
//!   references under it, so an append cannot slip in between the
//!   reference snapshot and the prune.
//! - `gc_guard` keeps GC passes from overlapping; a pass that finds it
//!   held is skipped.
//! - Readers take the `log` and `cache` read locks and may observe the
//!   state before or after any in-flight write.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use voicelog_types::{EntitySnapshot, LogEvent};

use crate::codec;
use crate::entity_cache::{EntityCache, GcReport, References};
use crate::error::StoreError;
use crate::keys;
use crate::kv::KeyValueStore;
use crate::log_store::LogStore;

/// Log + cache pair flushed to the store as one unit.
pub struct Journal {
    store: Arc<dyn KeyValueStore>,
    log: RwLock<LogStore>,
    cache: RwLock<EntityCache>,
    writer: Mutex<()>,
    gc_guard: Mutex<()>,
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal").finish_non_exhaustive()
    }
}

impl Journal {
    /// Create an empty journal over `store` without reading it.
    pub fn empty(store: Arc<dyn KeyValueStore>, max_len: usize) -> Self {
        Self::from_parts(store, LogStore::new(max_len), EntityCache::new())
    }

    fn from_parts(store: Arc<dyn KeyValueStore>, log: LogStore, cache: EntityCache) -> Self {
        Self {
            store,
            log: RwLock::new(log),
            cache: RwLock::new(cache),
            writer: Mutex::new(()),
            gc_guard: Mutex::new(()),
        }
    }

    /// Load the log and the three entity caches from `store` with a single
    /// multi-key read.
    ///
    /// Missing or malformed blobs load as empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store read itself fails.
    pub async fn load(store: Arc<dyn KeyValueStore>, max_len: usize) -> Result<Self, StoreError> {
        let blobs = store
            .get_many(&[
                keys::EVENT_LOG,
                keys::PARTICIPANT_CACHE,
                keys::GROUP_CACHE,
                keys::ROOM_CACHE,
            ])
            .await?;
        let mut blobs = blobs.into_iter();
        let mut next = || blobs.next().flatten();
        let (log_blob, participants_blob, groups_blob, rooms_blob) =
            (next(), next(), next(), next());

        let events: Vec<LogEvent> = codec::decode_or_default(keys::EVENT_LOG, log_blob.as_deref());
        let log = LogStore::from_events(events, max_len);
        let cache = EntityCache::from_maps(
            codec::decode_or_default(keys::PARTICIPANT_CACHE, participants_blob.as_deref()),
            codec::decode_or_default(keys::GROUP_CACHE, groups_blob.as_deref()),
            codec::decode_or_default(keys::ROOM_CACHE, rooms_blob.as_deref()),
        );

        let sizes = cache.sizes();
        tracing::info!(
            events = log.len(),
            participants = sizes.participants,
            groups = sizes.groups,
            rooms = sizes.rooms,
            "Journal loaded"
        );
        Ok(Self::from_parts(store, log, cache))
    }

    /// Append a batch of events and upsert the entities they reference.
    ///
    /// `events` is in arrival order. An empty batch performs no write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if encoding or the durable write fails; the
    /// in-memory log and cache are then unchanged.
    pub async fn append(
        &self,
        events: &[LogEvent],
        entities: Vec<EntitySnapshot>,
    ) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;

        let Some(next_log) = self.log.read().await.staged_append(events) else {
            return Ok(());
        };
        let mut next_cache = self.cache.read().await.clone();
        for entity in entities {
            next_cache.put(entity);
        }

        self.store
            .set_many(vec![
                (keys::EVENT_LOG.to_owned(), codec::encode(&next_log)?),
                (
                    keys::PARTICIPANT_CACHE.to_owned(),
                    next_cache.encode_participants()?,
                ),
                (keys::GROUP_CACHE.to_owned(), next_cache.encode_groups()?),
                (keys::ROOM_CACHE.to_owned(), next_cache.encode_rooms()?),
            ])
            .await?;

        let len = next_log.len();
        self.log.write().await.replace(next_log);
        *self.cache.write().await = next_cache;
        tracing::debug!(appended = events.len(), log_len = len, "Journal append committed");
        Ok(())
    }

    /// Prune cache entries no longer referenced by the log and persist the
    /// three cache keys. Waits for any in-flight append to commit first.
    ///
    /// Returns `Ok(None)` if another pass is already running. A pass that
    /// removes nothing performs no write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if encoding or the durable write fails; the
    /// in-memory cache is then unchanged.
    pub async fn collect_garbage(&self) -> Result<Option<GcReport>, StoreError> {
        let Ok(_gc) = self.gc_guard.try_lock() else {
            tracing::debug!("GC pass already running, skipping");
            return Ok(None);
        };

        // Appends hold `writer` from staging to commit, so the log read
        // here is the one the cache must agree with.
        let _writer = self.writer.lock().await;
        let refs = References::from_log(self.log.read().await.all());
        let mut next_cache = self.cache.read().await.clone();
        let report = next_cache.retain_referenced(&refs);
        if report.total() == 0 {
            tracing::debug!("GC pass removed nothing");
            return Ok(Some(report));
        }

        self.store
            .set_many(vec![
                (
                    keys::PARTICIPANT_CACHE.to_owned(),
                    next_cache.encode_participants()?,
                ),
                (keys::GROUP_CACHE.to_owned(), next_cache.encode_groups()?),
                (keys::ROOM_CACHE.to_owned(), next_cache.encode_rooms()?),
            ])
            .await?;
        *self.cache.write().await = next_cache;

        tracing::info!(
            participants = report.participants,
            groups = report.groups,
            rooms = report.rooms,
            "GC pass pruned entity cache"
        );
        Ok(Some(report))
    }

    /// Change the log capacity; applied on the next append.
    pub async fn set_max_len(&self, max_len: usize) {
        self.log.write().await.set_max_len(max_len);
    }

    /// Read access to the in-memory log.
    pub async fn read_log(&self) -> RwLockReadGuard<'_, LogStore> {
        self.log.read().await
    }

    /// Read access to the in-memory entity cache.
    pub async fn read_cache(&self) -> RwLockReadGuard<'_, EntityCache> {
        self.cache.read().await
    }

    /// Timestamp of the newest logged event, if any.
    pub async fn newest_at(&self) -> Option<i64> {
        self.log.read().await.newest_at()
    }

    /// The backing store handle.
    pub const fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }
}
