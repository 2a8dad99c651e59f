//! Broadcast surface for the Galaxy Events server.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/galaxy`) that sends every client an
//!   `INIT_STATE` snapshot on connect and a `GALAXY_STATE_UPDATE` frame
//!   whenever the active event list is published
//! - **REST endpoints** for status, history and catalog queries
//! - **Privileged REST endpoint** for manually triggering an event
//!
//! # Architecture
//!
//! Every request first passes the origin [`gate`]. Privileged routes
//! (event trigger, socket upgrade) additionally require the shared
//! bearer token in production. Connected sockets are tracked in a
//! [`registry::ClientRegistry`]; each client owns a bounded queue that
//! its socket task drains, so a slow or dead client never blocks a
//! broadcast to the others.
//!
//! [`AppState`] implements [`galaxy_core::StateSink`], which is how the
//! scheduler publishes each tick.

pub mod error;
pub mod gate;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use gate::{AccessPolicy, GateRejection};
pub use registry::{BroadcastReport, ClientRegistry};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
