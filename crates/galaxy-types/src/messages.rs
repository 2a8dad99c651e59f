//! `WebSocket` frames and REST request/response bodies.
//!
//! Field names follow the camelCase convention the browser client
//! already consumes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::events::{ActiveEvent, EventTypeDefinition};

// ---------------------------------------------------------------------------
// WebSocket (server -> client)
// ---------------------------------------------------------------------------

/// A message pushed from the server to a connected client.
///
/// Internally tagged on `type`, so the frames look like
/// `{"type":"INIT_STATE","events":[...],"clientCount":2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// Sent once, immediately after a connection is accepted.
    #[serde(rename = "INIT_STATE")]
    InitState {
        /// Currently active events.
        events: Vec<ActiveEvent>,
        /// Connected clients, including the recipient.
        #[serde(rename = "clientCount")]
        client_count: usize,
    },
    /// Sent to every open client on each tick and each manual trigger.
    #[serde(rename = "GALAXY_STATE_UPDATE")]
    GalaxyStateUpdate {
        /// Currently active events.
        events: Vec<ActiveEvent>,
    },
}

// ---------------------------------------------------------------------------
// REST
// ---------------------------------------------------------------------------

/// Body of `GET /api/galaxy/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct StatusResponse {
    /// Currently active events.
    pub active_events: Vec<ActiveEvent>,
    /// Number of connected `WebSocket` clients.
    pub client_count: usize,
    /// Server time in milliseconds since the Unix epoch.
    #[ts(type = "number")]
    pub timestamp: i64,
}

/// Body of `POST /api/galaxy/trigger-event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TriggerEventRequest {
    /// Event type identifier or display name.
    #[serde(rename = "type")]
    pub event_type: String,
}

/// Successful response of `POST /api/galaxy/trigger-event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TriggerEventResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
}

/// Body of `GET /api/galaxy/history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HistoryResponse {
    /// Recently created events, oldest first.
    pub events: Vec<ActiveEvent>,
    /// Number of entries in `events`.
    pub count: usize,
}

/// Body of `GET /api/galaxy/catalog`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CatalogResponse {
    /// Every event type the server can produce.
    pub event_types: Vec<EventTypeDefinition>,
}

/// JSON error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ErrorResponse {
    /// Description of what went wrong.
    pub error: String,
}
