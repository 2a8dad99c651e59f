//! Axum router construction for the Galaxy Events server.
//!
//! Layer order, outermost first:
//!
//! 1. hardened response headers (applied to every response, rejections
//!    included)
//! 2. request tracing
//! 3. CORS, answering preflights for allowed origins
//! 4. the origin gate
//!
//! The trigger and socket routes carry the token gate as a route layer.

use std::sync::Arc;

use axum::http::header::{
    AUTHORIZATION, CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::gate;
use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health` -- liveness check
/// - `GET /ws/galaxy` -- `WebSocket` state stream (token gate)
/// - `GET /api/galaxy/status` -- active events and client count
/// - `GET /api/galaxy/history` -- recently created events
/// - `GET /api/galaxy/catalog` -- event type definitions
/// - `POST /api/galaxy/trigger-event` -- manual trigger (token gate)
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors_policy = state.policy.clone();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .is_ok_and(|o| cors_policy.is_origin_allowed(o))
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let hardened_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ));

    let privileged = Router::new()
        .route("/api/galaxy/trigger-event", post(handlers::trigger_event))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            gate::require_token,
        ));

    let socket = Router::new()
        .route("/ws/galaxy", get(ws::ws_galaxy))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            gate::require_socket_token,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/galaxy/status", get(handlers::status))
        .route("/api/galaxy/history", get(handlers::history))
        .route("/api/galaxy/catalog", get(handlers::catalog))
        .merge(privileged)
        .merge(socket)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            gate::origin_gate,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(hardened_headers)
        .with_state(state)
}
