//! Shared type definitions for the Galaxy Events server.
//!
//! This crate is the single source of truth for every type that crosses
//! a process boundary: the static event catalog, live event instances,
//! and the JSON messages pushed over the `WebSocket` and returned by the
//! REST API. Types flow downstream to `TypeScript` via `ts-rs` for the
//! browser client.
//!
//! # Modules
//!
//! - [`ids`] -- Collision-resistant event identifiers
//! - [`enums`] -- Enumeration types (event severity)
//! - [`events`] -- Catalog entries and active event instances
//! - [`messages`] -- `WebSocket` frames and REST request/response bodies

pub mod enums;
pub mod events;
pub mod ids;
pub mod messages;

// Re-export all public types at crate root for convenience.
pub use enums::Severity;
pub use events::{ActiveEvent, EventTypeDefinition};
pub use ids::EventId;
pub use messages::{
    CatalogResponse, ErrorResponse, HistoryResponse, ServerMessage, StatusResponse,
    TriggerEventRequest, TriggerEventResponse,
};
