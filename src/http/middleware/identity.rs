//! Development identity header.
//!
//! Stamps a placeholder caller identity on requests that carry none. An
//! empty header value counts as none.
//! This is not authentication; collaborators must not trust the header.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::config::{IdentityConfig, ValidationError};

/// Header name, placeholder value and on/off switch.
#[derive(Debug, Clone)]
pub struct IdentityPolicy {
    pub enabled: bool,
    pub header: HeaderName,
    pub placeholder: HeaderValue,
}

impl IdentityPolicy {
    pub fn from_config(config: &IdentityConfig) -> Result<Self, ValidationError> {
        let header = HeaderName::from_bytes(config.header.as_bytes())
            .map_err(|_| ValidationError::InvalidHeaderName(config.header.clone()))?;
        let placeholder = HeaderValue::from_str(&config.placeholder)
            .map_err(|_| ValidationError::InvalidPlaceholder(config.placeholder.clone()))?;
        Ok(Self {
            enabled: config.enabled,
            header,
            placeholder,
        })
    }
}

pub async fn identity_middleware(
    State(policy): State<Arc<IdentityPolicy>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let absent = request
        .headers()
        .get(&policy.header)
        .map_or(true, |v| v.as_bytes().iter().all(u8::is_ascii_whitespace));
    if policy.enabled && absent {
        tracing::debug!(header = %policy.header, "Injecting placeholder identity");
        request
            .headers_mut()
            .insert(policy.header.clone(), policy.placeholder.clone());
    }
    next.run(request).await
}
