//! Shared application state for the Galaxy Events server.
//!
//! [`AppState`] bundles the simulation (behind an async mutex), the
//! connected-client registry and the access policy. It is wrapped in
//! [`Arc`] and injected via Axum's `State` extractor, and the scheduler
//! publishes through it as a [`StateSink`].
//!
//! Every broadcast is issued while the simulation lock is held. Because
//! new clients are registered under that same lock, a client's
//! `INIT_STATE` frame is always queued before any update it could see.

use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use galaxy_core::{GalaxySimulation, PublishError, StateSink};
use galaxy_types::{ActiveEvent, ServerMessage};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

use crate::error::ObserverError;
use crate::gate::AccessPolicy;
use crate::registry::{BroadcastReport, ClientHandle, ClientRegistry};

/// Shared state for the Axum application.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The simulation; lock it for every read or mutation.
    pub simulation: Arc<Mutex<GalaxySimulation>>,
    /// Connected `WebSocket` clients.
    pub clients: ClientRegistry,
    /// Origin and token rules.
    pub policy: AccessPolicy,
}

impl AppState {
    /// Create application state around an existing simulation.
    pub fn new(simulation: Arc<Mutex<GalaxySimulation>>, policy: AccessPolicy) -> Self {
        Self {
            simulation,
            clients: ClientRegistry::new(),
            policy,
        }
    }

    /// Serialize one `GALAXY_STATE_UPDATE` frame and queue it for every
    /// open client.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::Serialization`] if the frame cannot be
    /// encoded. Per-client failures are reported, not returned.
    pub fn broadcast_events(&self, events: &[ActiveEvent]) -> Result<BroadcastReport, ObserverError> {
        let message = ServerMessage::GalaxyStateUpdate {
            events: events.to_vec(),
        };
        let payload = Utf8Bytes::from(serde_json::to_string(&message)?);
        let report = self.clients.broadcast(&payload);
        debug!(
            events = events.len(),
            delivered = report.delivered,
            lagged = report.lagged,
            skipped = report.skipped,
            "Galaxy state broadcast"
        );
        Ok(report)
    }

    /// Register a new client and queue its `INIT_STATE` frame.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::Serialization`] if the snapshot cannot be
    /// encoded; the client is not left registered in that case.
    pub async fn connect_client(
        &self,
    ) -> Result<(ClientHandle, mpsc::Receiver<Utf8Bytes>), ObserverError> {
        let simulation = self.simulation.lock().await;
        let (handle, rx) = self.clients.connect();

        let message = ServerMessage::InitState {
            events: simulation.active().to_vec(),
            client_count: self.clients.client_count(),
        };
        let payload = Utf8Bytes::from(serde_json::to_string(&message)?);
        if !handle.send(payload) {
            warn!(client = %handle.id(), "Failed to queue INIT_STATE");
        }
        drop(simulation);

        Ok((handle, rx))
    }
}

impl StateSink for AppState {
    fn publish(&self, events: &[ActiveEvent]) -> Result<usize, PublishError> {
        self.broadcast_events(events)
            .map(|report| report.delivered)
            .map_err(|e| PublishError(e.to_string()))
    }
}
