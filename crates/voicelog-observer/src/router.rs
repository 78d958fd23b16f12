//! Axum router construction for the Observer API.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled for cross-origin presentation-layer access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::operator;
use crate::state::AppState;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /api/logs` -- filtered log query
/// - `GET /api/status` -- pipeline status
/// - `GET /api/observation` -- observation config
/// - `PUT|DELETE /api/observation/groups/{id}` -- observe / unobserve
/// - `PUT|DELETE /api/observation/excluded-rooms/{id}` -- exclude / include
/// - `POST /api/ingestion/enable` and `/api/ingestion/disable`
/// - `PATCH /api/settings` -- capacity and display limit
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Queries
        .route("/api/logs", get(handlers::list_logs))
        .route("/api/status", get(handlers::get_status))
        // Observation config
        .route("/api/observation", get(handlers::get_observation))
        .route(
            "/api/observation/groups/{id}",
            put(handlers::observe_group).delete(handlers::unobserve_group),
        )
        .route(
            "/api/observation/excluded-rooms/{id}",
            put(handlers::exclude_room).delete(handlers::include_room),
        )
        // Operator control
        .route("/api/ingestion/enable", post(operator::enable_ingestion))
        .route("/api/ingestion/disable", post(operator::disable_ingestion))
        .route("/api/settings", patch(operator::update_settings))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
