//! JSON body parsing.
//!
//! Bodies declared as JSON are buffered (up to the configured limit),
//! parsed, and attached to the request as [`JsonBody`]. The original bytes
//! are forwarded unchanged. A body that fails to parse ends the request here
//! with 400, so no collaborator ever sees it.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;

use crate::config::BodyConfig;
use crate::error::GatewayError;
use crate::observability::metrics;

/// Parsed JSON payload, available as a request extension.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

/// Size limit and strictness for JSON bodies.
#[derive(Debug, Clone)]
pub struct BodyPolicy {
    pub max_bytes: usize,
    pub strict: bool,
}

impl From<&BodyConfig> for BodyPolicy {
    fn from(config: &BodyConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            strict: config.strict,
        }
    }
}

/// `application/json` or any `application/*+json`, parameters ignored.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match essence.split_once('/') {
        Some(("application", subtype)) => subtype == "json" || subtype.ends_with("+json"),
        _ => false,
    }
}

/// Parse `bytes`, enforcing top-level object/array in strict mode.
pub fn parse_json(bytes: &[u8], strict: bool) -> Result<Value, GatewayError> {
    if strict {
        let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
        if !matches!(first, Some(b'{') | Some(b'[')) {
            return Err(GatewayError::MalformedBody(
                "expected a JSON object or array".to_string(),
            ));
        }
    }
    serde_json::from_slice(bytes).map_err(|e| GatewayError::MalformedBody(e.to_string()))
}

pub async fn json_body_middleware(
    State(policy): State<Arc<BodyPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_json_content_type(request.headers()) {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();

    let declared = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > policy.max_bytes) {
        return reject(GatewayError::PayloadTooLarge { limit: policy.max_bytes });
    }

    let bytes = match Limited::new(body, policy.max_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return reject(GatewayError::PayloadTooLarge { limit: policy.max_bytes });
        }
        Err(e) => {
            return reject(GatewayError::MalformedBody(format!("failed to read body: {}", e)));
        }
    };

    if !bytes.is_empty() {
        match parse_json(&bytes, policy.strict) {
            Ok(value) => {
                parts.extensions.insert(JsonBody(value));
            }
            Err(err) => return reject(err),
        }
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn reject(err: GatewayError) -> Response {
    tracing::warn!(error = %err, "Request body rejected");
    metrics::record_rejection(err.kind());
    err.into_response()
}
