//! HTTP server lifecycle management.
//!
//! Provides [`start_server`] which binds to a TCP port and serves the
//! router until the supplied shutdown future resolves.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Listening address for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: galaxy_core::config::DEFAULT_PORT,
        }
    }
}

impl From<&galaxy_core::config::ServerSettings> for ServerConfig {
    fn from(settings: &galaxy_core::config::ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
        }
    }
}

/// Start the HTTP server.
///
/// Binds to the configured address, builds the router, and serves
/// requests until `shutdown` completes. Open sockets are closed as part
/// of the graceful shutdown, which unregisters their clients.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind or the server
/// encounters a fatal I/O error.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "Galaxy events server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("Galaxy events server stopped");
    Ok(())
}

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
