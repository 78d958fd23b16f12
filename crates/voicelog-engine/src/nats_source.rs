//! NATS upstream source for the engine.
//!
//! The upstream gateway publishes session state batches and entity
//! metadata on NATS. [`NatsSource`] subscribes to both and drives the
//! [`Recorder`] and the live [`Directory`].
//!
//! # Subject Convention
//!
//! - **State batches:** `voicelog.states`, a JSON array of session state
//!   snapshots in upstream order
//! - **Entity upserts:** `voicelog.entities.{participant|group|room}`, the
//!   JSON metadata of one entity
//! - **Entity removals:** `voicelog.entities.{participant|group|room}.removed`,
//!   the raw id as UTF-8 text
//!
//! Batches are handled one at a time on a single task, so the recorder
//! sees them in delivery order.

use std::sync::Arc;

use futures::StreamExt as _;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use voicelog_core::{Directory, Recorder};
use voicelog_types::{
    EntityKind, EntitySnapshot, GroupInfo, ParticipantInfo, RoomInfo, SessionStateSnapshot,
};

use crate::error::EngineError;

/// Subject carrying state batches.
pub const STATES_SUBJECT: &str = "voicelog.states";

/// Wildcard covering every entity subject.
pub const ENTITIES_SUBJECT: &str = "voicelog.entities.>";

const ENTITY_PREFIX: &str = "voicelog.entities.";
const REMOVED_SUFFIX: &str = ".removed";

/// A decoded upstream message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// An ordered batch of session state snapshots.
    Batch(Vec<SessionStateSnapshot>),
    /// Entity metadata to insert or replace.
    Upsert(EntitySnapshot),
    /// An entity that no longer exists upstream.
    Removed(EntityKind, String),
}

/// Reasons an upstream message could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The subject is not one this source understands.
    #[error("unrecognized subject: {0}")]
    Subject(String),

    /// The payload did not deserialize.
    #[error("malformed payload on {subject}: {source}")]
    Payload {
        /// Subject the payload arrived on.
        subject: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A removal payload was not a usable id.
    #[error("removal on {0} carried no id")]
    EmptyId(String),
}

/// Decode one message by subject.
///
/// # Errors
///
/// Returns a [`DecodeError`] for unknown subjects, malformed JSON, or an
/// empty removal id.
pub fn decode(subject: &str, payload: &[u8]) -> Result<Inbound, DecodeError> {
    if subject == STATES_SUBJECT {
        return serde_json::from_slice(payload)
            .map(Inbound::Batch)
            .map_err(|source| payload_error(subject, source));
    }

    let rest = subject
        .strip_prefix(ENTITY_PREFIX)
        .ok_or_else(|| DecodeError::Subject(subject.to_owned()))?;

    if let Some(kind) = rest.strip_suffix(REMOVED_SUFFIX) {
        let kind: EntityKind = kind
            .parse()
            .map_err(|e: String| DecodeError::Subject(format!("{subject} ({e})")))?;
        let id = String::from_utf8_lossy(payload).trim().to_owned();
        if id.is_empty() {
            return Err(DecodeError::EmptyId(subject.to_owned()));
        }
        return Ok(Inbound::Removed(kind, id));
    }

    let kind: EntityKind = rest
        .parse()
        .map_err(|e: String| DecodeError::Subject(format!("{subject} ({e})")))?;
    let snapshot = match kind {
        EntityKind::Participant => serde_json::from_slice::<ParticipantInfo>(payload)
            .map(EntitySnapshot::Participant),
        EntityKind::Group => {
            serde_json::from_slice::<GroupInfo>(payload).map(EntitySnapshot::Group)
        }
        EntityKind::Room => serde_json::from_slice::<RoomInfo>(payload).map(EntitySnapshot::Room),
    }
    .map_err(|source| payload_error(subject, source))?;

    Ok(Inbound::Upsert(snapshot))
}

fn payload_error(subject: &str, source: serde_json::Error) -> DecodeError {
    DecodeError::Payload {
        subject: subject.to_owned(),
        source,
    }
}

/// Subscribes to the upstream subjects and feeds the pipeline.
pub struct NatsSource {
    client: async_nats::Client,
    recorder: Arc<Recorder>,
    directory: Arc<Directory>,
}

impl NatsSource {
    /// Connect to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Nats`] if the connection fails.
    pub async fn connect(
        url: &str,
        recorder: Arc<Recorder>,
        directory: Arc<Directory>,
    ) -> Result<Self, EngineError> {
        let client = async_nats::connect(url).await.map_err(|e| EngineError::Nats {
            message: format!("failed to connect to NATS at {url}: {e}"),
        })?;
        Ok(Self {
            client,
            recorder,
            directory,
        })
    }

    /// Subscribe and process messages until `shutdown` flips to `true`,
    /// its sender is dropped, or both subscriptions close.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Nats`] if a subscription cannot be created.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), EngineError> {
        let states = self.subscribe(STATES_SUBJECT).await?;
        let entities = self.subscribe(ENTITIES_SUBJECT).await?;
        let mut messages = futures::stream::select(states, entities);
        info!(
            states = STATES_SUBJECT,
            entities = ENTITIES_SUBJECT,
            "NATS source subscribed"
        );

        loop {
            tokio::select! {
                next = messages.next() => {
                    let Some(msg) = next else {
                        warn!("NATS subscriptions closed");
                        break;
                    };
                    self.handle(msg.subject.as_str(), &msg.payload).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("NATS source stopped");
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<async_nats::Subscriber, EngineError> {
        self.client
            .subscribe(subject.to_owned())
            .await
            .map_err(|e| EngineError::Nats {
                message: format!("failed to subscribe to {subject}: {e}"),
            })
    }

    async fn handle(&self, subject: &str, payload: &[u8]) {
        match decode(subject, payload) {
            Ok(Inbound::Batch(batch)) => match self.recorder.ingest(&batch).await {
                Ok(recorded) => debug!(size = batch.len(), recorded, "Batch handled"),
                Err(e) => warn!(error = %e, size = batch.len(), "Batch dropped"),
            },
            Ok(Inbound::Upsert(snapshot)) => {
                debug!(kind = %snapshot.kind(), id = snapshot.id(), "Entity updated");
                self.directory.upsert(snapshot);
            }
            Ok(Inbound::Removed(kind, id)) => {
                let removed = self.directory.remove(kind, &id);
                debug!(%kind, id = %id, removed, "Entity removed");
            }
            Err(e) => warn!(error = %e, "Ignoring upstream message"),
        }
    }
}
