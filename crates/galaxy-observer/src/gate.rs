//! Origin and bearer-token gate.
//!
//! Two checks guard the server:
//!
//! - **Origin** ([`origin_gate`], every route). Development allows any
//!   origin. Production allows only the configured allow-list, or no
//!   cross-origin caller at all when the list is absent. A request with
//!   no `Origin` header is same-origin and always passes.
//! - **Token** ([`require_token`] for the trigger route,
//!   [`require_socket_token`] for the socket upgrade). Development skips
//!   it. Production refuses outright when no token is configured and
//!   otherwise demands `Authorization: Bearer <token>`.
//!
//! Unreadable header values are rejections, never panics.

use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::header::{AUTHORIZATION, ORIGIN};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use galaxy_core::RuntimeMode;
use galaxy_core::config::AccessConfig;
use galaxy_types::ErrorResponse;
use tracing::debug;

use crate::state::AppState;

/// Why the gate turned a request away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateRejection {
    /// The `Origin` header names a site that is not allowed.
    #[error("Origin not allowed")]
    OriginNotAllowed,

    /// Production deployment without a configured token.
    #[error("Disabled in production unless API_TOKEN is set")]
    AuthDisabled,

    /// Missing or wrong bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// A gate header could not be read.
    #[error("Bad request")]
    MalformedHeader,
}

impl GateRejection {
    /// HTTP status sent for this rejection.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::OriginNotAllowed | Self::AuthDisabled => StatusCode::FORBIDDEN,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MalformedHeader => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Access rules derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    mode: RuntimeMode,
    allowed_origins: Option<Vec<String>>,
    api_token: Option<String>,
}

impl AccessPolicy {
    /// Build a policy for `mode` from the access settings.
    pub fn new(mode: RuntimeMode, access: &AccessConfig) -> Self {
        Self {
            mode,
            allowed_origins: access.allowed_origins.clone(),
            api_token: access.api_token.clone(),
        }
    }

    /// A permissive development policy.
    pub const fn development() -> Self {
        Self {
            mode: RuntimeMode::Development,
            allowed_origins: None,
            api_token: None,
        }
    }

    /// A production policy with the given allow-list and token.
    pub const fn production(allowed_origins: Option<Vec<String>>, api_token: Option<String>) -> Self {
        Self {
            mode: RuntimeMode::Production,
            allowed_origins,
            api_token,
        }
    }

    /// The deployment mode this policy enforces.
    pub const fn mode(&self) -> RuntimeMode {
        self.mode
    }

    /// Whether a token is configured.
    pub const fn has_token(&self) -> bool {
        self.api_token.is_some()
    }

    /// Whether a cross-origin caller from `origin` is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        match self.mode {
            RuntimeMode::Development => true,
            RuntimeMode::Production => self
                .allowed_origins
                .as_ref()
                .is_some_and(|list| list.iter().any(|o| o == origin)),
        }
    }

    /// Check the raw `Origin` header of a request.
    ///
    /// # Errors
    ///
    /// Returns [`GateRejection::OriginNotAllowed`] for a disallowed
    /// origin and [`GateRejection::MalformedHeader`] if the header is not
    /// visible ASCII.
    pub fn check_origin(&self, origin: Option<&HeaderValue>) -> Result<(), GateRejection> {
        let Some(raw) = origin else {
            return Ok(());
        };
        let origin = raw.to_str().map_err(|_| GateRejection::MalformedHeader)?;
        if self.is_origin_allowed(origin) {
            Ok(())
        } else {
            Err(GateRejection::OriginNotAllowed)
        }
    }

    /// Check the caller's token for a privileged route.
    ///
    /// `query_token` is only consulted when no `Authorization` header is
    /// sent. A header with another scheme or an unreadable value is
    /// rejected outright.
    ///
    /// # Errors
    ///
    /// Returns [`GateRejection::AuthDisabled`] in production without a
    /// configured token, and [`GateRejection::Unauthorized`] when the
    /// presented token is absent, unreadable, or wrong.
    pub fn check_token(
        &self,
        headers: &HeaderMap,
        query_token: Option<&str>,
    ) -> Result<(), GateRejection> {
        if self.mode == RuntimeMode::Development {
            return Ok(());
        }
        let Some(expected) = self.api_token.as_deref() else {
            return Err(GateRejection::AuthDisabled);
        };

        // A present header always decides, even when it is unusable.
        let provided = if headers.contains_key(AUTHORIZATION) {
            bearer_token(headers)
        } else {
            query_token
        };
        match provided.map(str::trim) {
            Some(token) if !token.is_empty() && token == expected => Ok(()),
            _ => Err(GateRejection::Unauthorized),
        }
    }
}

/// Extract `<token>` from `Authorization: Bearer <token>`.
///
/// Any other scheme, or a non-ASCII header value, yields `None`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Query string accepted on the socket upgrade route.
#[derive(Debug, Default, serde::Deserialize)]
pub struct TokenQuery {
    /// Bearer token for clients that cannot set headers.
    pub token: Option<String>,
}

/// Reject requests from disallowed origins.
pub async fn origin_gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(rejection) = state.policy.check_origin(request.headers().get(ORIGIN)) {
        debug!(
            path = %request.uri().path(),
            reason = %rejection,
            "Request rejected by origin gate"
        );
        return rejection.into_response();
    }
    next.run(request).await
}

/// Require the bearer token from the `Authorization` header.
pub async fn require_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(rejection) = state.policy.check_token(request.headers(), None) {
        debug!(
            path = %request.uri().path(),
            reason = %rejection,
            "Request rejected by token gate"
        );
        return rejection.into_response();
    }
    next.run(request).await
}

/// Require the bearer token from the header or the `token` query value.
pub async fn require_socket_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    // An unparseable query string simply provides no token.
    let query = Query::<TokenQuery>::try_from_uri(request.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();

    if let Err(rejection) = state
        .policy
        .check_token(request.headers(), query.token.as_deref())
    {
        debug!(reason = %rejection, "WebSocket upgrade rejected by token gate");
        return rejection.into_response();
    }
    next.run(request).await
}
