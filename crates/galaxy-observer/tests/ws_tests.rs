//! `WebSocket` tests against a real listener.
//!
//! The router is served on an ephemeral port and driven with a
//! `tokio-tungstenite` client, so the upgrade, the socket task's
//! forwarding loop, ping handling and unregistration on close all run
//! exactly as in production.

#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use galaxy_core::{EventCatalog, GalaxySimulation};
use galaxy_observer::gate::AccessPolicy;
use galaxy_observer::router::build_router;
use galaxy_observer::state::AppState;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn serve(policy: AccessPolicy) -> (Arc<AppState>, SocketAddr) {
    let catalog = Arc::new(EventCatalog::builtin());
    let simulation = Arc::new(Mutex::new(GalaxySimulation::new(catalog, 0.0, 50)));
    let state = Arc::new(AppState::new(simulation, policy));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(Arc::clone(&state));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (state, addr)
}

/// Next text frame as JSON, skipping control frames.
async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(WAIT, client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn wait_for_clients(state: &AppState, expected: usize) {
    tokio::time::timeout(WAIT, async {
        while state.clients.client_count() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_socket_lifecycle() {
    let (state, addr) = serve(AccessPolicy::development()).await;

    let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/galaxy"))
        .await
        .unwrap();

    let init = next_json(&mut client).await;
    assert_eq!(init["type"], "INIT_STATE");
    assert_eq!(init["clientCount"], 1);
    assert_eq!(init["events"].as_array().unwrap().len(), 0);
    assert_eq!(state.clients.client_count(), 1);

    // A state change reaches the socket.
    {
        let mut sim = state.simulation.lock().await;
        sim.trigger("COMET_FLYBY", 0);
        state.broadcast_events(sim.active()).unwrap();
    }
    let update = next_json(&mut client).await;
    assert_eq!(update["type"], "GALAXY_STATE_UPDATE");
    assert_eq!(update["events"][0]["type"], "COMET_FLYBY");

    // Pings are answered.
    client.send(Message::Ping("hi".into())).await.unwrap();
    let pong = loop {
        let frame = tokio::time::timeout(WAIT, client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Pong(payload) = frame {
            break payload;
        }
    };
    assert_eq!(pong.as_ref(), b"hi");

    // Closing unregisters the client exactly once.
    client.close(None).await.unwrap();
    wait_for_clients(&state, 0).await;
}

#[tokio::test]
async fn test_dropped_connection_unregisters() {
    let (state, addr) = serve(AccessPolicy::development()).await;

    let (mut first, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/galaxy"))
        .await
        .unwrap();
    next_json(&mut first).await;
    let (mut second, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/galaxy"))
        .await
        .unwrap();
    let init = next_json(&mut second).await;
    assert_eq!(init["clientCount"], 2);

    // No close frame, just a dead TCP connection.
    drop(first);
    wait_for_clients(&state, 1).await;

    state.broadcast_events(&[]).unwrap();
    let update = next_json(&mut second).await;
    assert_eq!(update["type"], "GALAXY_STATE_UPDATE");
}

#[tokio::test]
async fn test_socket_handshake_is_gated_in_production() {
    let policy = AccessPolicy::production(None, Some(String::from("s3cret")));
    let (state, addr) = serve(policy).await;

    let refused = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/galaxy")).await;
    let Err(tokio_tungstenite::tungstenite::Error::Http(response)) = refused else {
        panic!("handshake without a token was accepted");
    };
    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(state.clients.client_count(), 0);

    let (mut client, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}/ws/galaxy?token=s3cret"))
            .await
            .unwrap();
    let init = next_json(&mut client).await;
    assert_eq!(init["type"], "INIT_STATE");
}
