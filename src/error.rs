//! Errors produced by the gateway itself.
//!
//! Collaborator responses, including non-2xx ones, are never wrapped here;
//! they go back to the caller verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Terminal failures of the request pipeline.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Origin not in the allow-list.
    #[error("Origin `{origin}` is not allowed by CORS policy")]
    AccessDenied { origin: String },

    /// JSON body failed to parse.
    #[error("Malformed JSON body: {0}")]
    MalformedBody(String),

    /// Body exceeds the configured limit.
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// No route prefix matched.
    #[error("No route matches `{path}`")]
    NoRoute { path: String },

    /// Network failure talking to a collaborator.
    #[error("Collaborator `{collaborator}` is unreachable: {reason}")]
    CollaboratorUnreachable { collaborator: String, reason: String },

    /// Collaborator did not answer in time.
    #[error("Collaborator `{collaborator}` did not respond within {secs}s")]
    CollaboratorTimeout { collaborator: String, secs: u64 },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::AccessDenied { .. } => StatusCode::FORBIDDEN,
            GatewayError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::NoRoute { .. } => StatusCode::NOT_FOUND,
            GatewayError::CollaboratorUnreachable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::CollaboratorTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Stable identifier for the error body and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::AccessDenied { .. } => "access_denied",
            GatewayError::MalformedBody(_) => "malformed_body",
            GatewayError::PayloadTooLarge { .. } => "payload_too_large",
            GatewayError::NoRoute { .. } => "not_found",
            GatewayError::CollaboratorUnreachable { .. } => "collaborator_unreachable",
            GatewayError::CollaboratorTimeout { .. } => "collaborator_timeout",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}
