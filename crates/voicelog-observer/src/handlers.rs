//! REST API endpoint handlers for the Observer server.
//!
//! Read handlers go through the [`Recorder`](voicelog_core::Recorder)'s
//! query path; mutating handlers persist before they apply.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/logs` | Filtered, enriched log query |
//! | `GET` | `/api/status` | Pipeline status |
//! | `GET` | `/api/observation` | Observed groups and excluded rooms |
//! | `PUT` | `/api/observation/groups/{id}` | Observe a group |
//! | `DELETE` | `/api/observation/groups/{id}` | Stop observing a group |
//! | `PUT` | `/api/observation/excluded-rooms/{id}` | Exclude a room |
//! | `DELETE` | `/api/observation/excluded-rooms/{id}` | Lift a room exclusion |

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;
use voicelog_core::LogFilter;
use voicelog_types::{GroupId, RoomId};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/logs` endpoint.
///
/// List parameters are comma-separated and use the same labels as the
/// serialized log (`Join`, `self-mute-on`, `selfMuted`, ...).
#[derive(Debug, Default, serde::Deserialize)]
pub struct LogsQuery {
    /// Free-text search.
    pub q: Option<String>,
    /// Transition kinds.
    pub moves: Option<String>,
    /// Change flags.
    pub changes: Option<String>,
    /// Active attributes.
    pub active: Option<String>,
    /// Maximum number of events (defaults to the display limit).
    pub limit: Option<usize>,
}

impl LogsQuery {
    /// Convert into a [`LogFilter`].
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::InvalidQuery`] on an unknown label.
    pub fn to_filter(&self) -> Result<LogFilter, ObserverError> {
        Ok(LogFilter {
            search: self.q.clone().unwrap_or_default(),
            moves: parse_labels("moves", self.moves.as_deref())?,
            changes: parse_labels("changes", self.changes.as_deref())?,
            active: parse_labels("active", self.active.as_deref())?,
        })
    }
}

/// Parse a comma-separated list of serialized enum labels.
fn parse_labels<T>(param: &str, raw: Option<&str>) -> Result<BTreeSet<T>, ObserverError>
where
    T: DeserializeOwned + Ord,
{
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(|label| {
            serde_json::from_value(serde_json::Value::String(label.to_owned()))
                .map_err(|e| ObserverError::InvalidQuery(format!("{param}: {e}")))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// GET /api/logs
// ---------------------------------------------------------------------------

/// Query the log, newest first.
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let filter = params.to_filter()?;
    let events = state.recorder.list(&filter, params.limit).await;

    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Report ingestion state, log size and capacity, and cache sizes.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.recorder.status().await)
}

// ---------------------------------------------------------------------------
// Observation config
// ---------------------------------------------------------------------------

/// Return the observed groups and excluded rooms.
pub async fn get_observation(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.recorder.observation().await)
}

/// Start observing a group.
pub async fn observe_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let changed = state.recorder.observe_group(GroupId::new(id)).await?;
    Ok(Json(serde_json::json!({ "changed": changed })))
}

/// Stop observing a group.
pub async fn unobserve_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let changed = state.recorder.unobserve_group(&GroupId::new(id)).await?;
    Ok(Json(serde_json::json!({ "changed": changed })))
}

/// Exclude a room from observation.
pub async fn exclude_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let changed = state.recorder.exclude_room(RoomId::new(id)).await?;
    Ok(Json(serde_json::json!({ "changed": changed })))
}

/// Lift a room exclusion.
pub async fn include_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let changed = state.recorder.include_room(&RoomId::new(id)).await?;
    Ok(Json(serde_json::json!({ "changed": changed })))
}

#[cfg(test)]
mod tests {
    use voicelog_types::{Attribute, ChangeFlag, MoveKind};

    use super::*;

    #[test]
    fn parses_serialized_labels() {
        let query = LogsQuery {
            q: Some(String::from("alice")),
            moves: Some(String::from("Join, Move")),
            changes: Some(String::from("self-mute-on")),
            active: Some(String::from("videoEnabled,")),
            limit: None,
        };
        let filter = query.to_filter().ok().unwrap_or_default();
        assert_eq!(filter.search, "alice");
        assert_eq!(filter.moves, BTreeSet::from([MoveKind::Join, MoveKind::Move]));
        assert_eq!(filter.changes, BTreeSet::from([ChangeFlag::SelfMuteOn]));
        assert_eq!(filter.active, BTreeSet::from([Attribute::VideoEnabled]));
    }

    #[test]
    fn missing_params_mean_no_filter() {
        let filter = LogsQuery::default().to_filter().ok().unwrap_or_default();
        assert_eq!(filter, LogFilter::default());
    }

    #[test]
    fn unknown_label_is_rejected() {
        let query = LogsQuery {
            changes: Some(String::from("self-mute-sideways")),
            ..LogsQuery::default()
        };
        assert!(matches!(
            query.to_filter(),
            Err(ObserverError::InvalidQuery(_))
        ));
    }
}
