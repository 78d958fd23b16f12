//! Operator REST API handlers for runtime pipeline control.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/ingestion/enable` | Start ingesting batches |
//! | `POST` | `/api/ingestion/disable` | Stop ingesting batches |
//! | `PATCH` | `/api/settings` | Change log capacity and display limit |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `PATCH /api/settings`. Omitted fields are unchanged;
/// values below 1 are raised to 1.
#[derive(Debug, Default, serde::Deserialize)]
pub struct SettingsRequest {
    /// New log capacity.
    pub max_history_size: Option<usize>,
    /// New default query size.
    pub display_limit: Option<usize>,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    /// Whether the operation succeeded.
    ok: bool,
    /// Human-readable message.
    message: String,
}

// ---------------------------------------------------------------------------
// POST /api/ingestion/enable
// ---------------------------------------------------------------------------

/// Enable ingestion.
pub async fn enable_ingestion(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.recorder.enable();
    Json(OperatorResponse {
        ok: true,
        message: String::from("ingestion enabled"),
    })
}

// ---------------------------------------------------------------------------
// POST /api/ingestion/disable
// ---------------------------------------------------------------------------

/// Disable ingestion. Responds once any in-flight batch has finished.
pub async fn disable_ingestion(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.recorder.disable().await;
    Json(OperatorResponse {
        ok: true,
        message: String::from("ingestion disabled"),
    })
}

// ---------------------------------------------------------------------------
// PATCH /api/settings
// ---------------------------------------------------------------------------

/// Apply settings and return the effective (clamped) values.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SettingsRequest>,
) -> impl IntoResponse {
    let recorder = &state.recorder;
    if let Some(max_len) = body.max_history_size {
        recorder.set_max_history(max_len).await;
    }
    if let Some(limit) = body.display_limit {
        recorder.set_display_limit(limit);
    }

    let status = recorder.status().await;
    Json(serde_json::json!({
        "max_history_size": status.max_history_size,
        "display_limit": status.display_limit,
    }))
}
