//! REST API endpoint handlers for the Galaxy Events server.
//!
//! # Endpoints
//!
//! | Method | Path | Gate | Description |
//! |--------|------|------|-------------|
//! | `GET` | `/health` | origin | Liveness check |
//! | `GET` | `/api/galaxy/status` | origin | Active events, client count, server time |
//! | `GET` | `/api/galaxy/history` | origin | Recently created events |
//! | `GET` | `/api/galaxy/catalog` | origin | Event type definitions |
//! | `POST` | `/api/galaxy/trigger-event` | origin + token | Create an event and broadcast it |

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use axum::Json;
use galaxy_core::clock::now_millis;
use galaxy_types::{
    CatalogResponse, HistoryResponse, StatusResponse, TriggerEventRequest, TriggerEventResponse,
};
use tracing::warn;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Report that the server is up.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// GET /api/galaxy/status
// ---------------------------------------------------------------------------

/// Return the active events, connected client count and server time.
///
/// Read-only: expired events still present (no cleanup has run since
/// they expired) are returned as-is.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let active_events = state.simulation.lock().await.active().to_vec();

    Json(StatusResponse {
        active_events,
        client_count: state.clients.client_count(),
        timestamp: now_millis(),
    })
}

// ---------------------------------------------------------------------------
// GET /api/galaxy/history
// ---------------------------------------------------------------------------

/// Return recently created events, oldest first.
pub async fn history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let events = state.simulation.lock().await.history();
    let count = events.len();
    Json(HistoryResponse { events, count })
}

// ---------------------------------------------------------------------------
// GET /api/galaxy/catalog
// ---------------------------------------------------------------------------

/// Return every event type the server can produce.
pub async fn catalog(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let event_types = state.simulation.lock().await.event_types();
    Json(CatalogResponse { event_types })
}

// ---------------------------------------------------------------------------
// POST /api/galaxy/trigger-event
// ---------------------------------------------------------------------------

/// Create an event of the requested type and broadcast immediately.
///
/// The body is `{"type": "<identifier or display name>"}`. An unknown
/// type yields `400 {"error":"Invalid event type"}` and changes nothing.
/// The token gate has already run by the time this handler is reached.
pub async fn trigger_event(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TriggerEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ObserverError> {
    let Json(request) = body.map_err(|e| ObserverError::InvalidBody(e.body_text()))?;

    let mut simulation = state.simulation.lock().await;
    let event = simulation
        .trigger(&request.event_type, now_millis())
        .ok_or(ObserverError::InvalidEventType)?;

    // The event is stored either way; a failed broadcast reaches clients
    // on the next tick.
    if let Err(e) = state.broadcast_events(simulation.active()) {
        warn!(error = %e, "Broadcast after manual trigger failed");
    }
    drop(simulation);

    Ok(Json(TriggerEventResponse {
        success: true,
        message: format!("Event {} triggered", event.name),
    }))
}
