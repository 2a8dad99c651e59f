//! Error types for the Galaxy Events HTTP layer.
//!
//! [`ObserverError`] unifies handler failures into a single enum that
//! converts into an Axum response with a JSON `{"error": ...}` body.
//! Gate failures have their own type, [`crate::gate::GateRejection`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use galaxy_types::ErrorResponse;

/// Errors that can occur in the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The trigger request named no known event type.
    #[error("Invalid event type")]
    InvalidEventType,

    /// The request body could not be parsed.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidEventType | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}
