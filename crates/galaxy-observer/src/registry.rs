//! Set of connected `WebSocket` clients.
//!
//! Each client gets a bounded queue of pre-serialized frames. The socket
//! task owns the receiving end and a [`ClientHandle`]; dropping the
//! handle removes the client from the registry, so the client count goes
//! down exactly once per connection however the socket ends.
//!
//! [`ClientRegistry::broadcast`] copies the sender list out of the lock
//! before sending, so clients may connect or disconnect mid-broadcast.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Frames a client may have queued before it is considered lagging.
pub const CLIENT_QUEUE_CAPACITY: usize = 64;

/// Process-unique identifier of a connected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(u64);

impl core::fmt::Display for ClientId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Outcome of one [`ClientRegistry::broadcast`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    /// Open clients a send was attempted on.
    pub attempted: usize,
    /// Clients whose queue accepted the frame.
    pub delivered: usize,
    /// Clients whose queue was full; the frame was dropped for them.
    pub lagged: usize,
    /// Registered clients whose socket had already closed.
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    clients: BTreeMap<ClientId, mpsc::Sender<Utf8Bytes>>,
}

/// Shared registry of connected clients.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client.
    ///
    /// Returns the handle that keeps the client registered and the
    /// receiver its socket task should drain.
    pub fn connect(&self) -> (ClientHandle, mpsc::Receiver<Utf8Bytes>) {
        let (tx, rx) = mpsc::channel(CLIENT_QUEUE_CAPACITY);
        let mut inner = self.lock();
        let id = ClientId(inner.next_id);
        inner.next_id = inner.next_id.wrapping_add(1);
        inner.clients.insert(id, tx.clone());
        let count = inner.clients.len();
        drop(inner);

        debug!(client = %id, clients = count, "Client registered");

        let handle = ClientHandle {
            id,
            tx,
            registry: Arc::clone(&self.inner),
        };
        (handle, rx)
    }

    /// Number of currently registered clients.
    pub fn client_count(&self) -> usize {
        self.lock().clients.len()
    }

    /// Queue `payload` for every open client.
    ///
    /// The same bytes are handed to each client. Closed clients are
    /// skipped and a full queue only affects its own client.
    pub fn broadcast(&self, payload: &Utf8Bytes) -> BroadcastReport {
        let snapshot: Vec<(ClientId, mpsc::Sender<Utf8Bytes>)> = self
            .lock()
            .clients
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut report = BroadcastReport::default();
        for (id, tx) in snapshot {
            if tx.is_closed() {
                report.skipped = report.skipped.saturating_add(1);
                continue;
            }
            report.attempted = report.attempted.saturating_add(1);
            match tx.try_send(payload.clone()) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(client = %id, "Client queue full, dropping frame");
                    report.lagged = report.lagged.saturating_add(1);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(client = %id, "Client closed during broadcast");
                    report.skipped = report.skipped.saturating_add(1);
                    report.attempted = report.attempted.saturating_sub(1);
                }
            }
        }
        report
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration of one client; unregisters on drop.
#[derive(Debug)]
pub struct ClientHandle {
    id: ClientId,
    tx: mpsc::Sender<Utf8Bytes>,
    registry: Arc<Mutex<Inner>>,
}

impl ClientHandle {
    /// This client's identifier.
    pub const fn id(&self) -> ClientId {
        self.id
    }

    /// Queue a frame for this client only.
    ///
    /// Returns `false` if the client is gone or its queue is full.
    pub fn send(&self, payload: Utf8Bytes) -> bool {
        self.tx.try_send(payload).is_ok()
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        let mut inner = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        inner.clients.remove(&self.id);
        let count = inner.clients.len();
        drop(inner);
        debug!(client = %self.id, clients = count, "Client unregistered");
    }
}
