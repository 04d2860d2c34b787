//! Cross-origin access control.
//!
//! Requests without an `Origin` header pass. Requests from an origin on the
//! allow-list pass and get the CORS header set from [`CorsLayer`].
//! Everything else is rejected by [`origin_guard`] before any later stage
//! runs. `CorsLayer` answers every `OPTIONS` request itself, so preflights
//! never reach a collaborator; the guard turns those answers into 204.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, HeaderMap, HeaderName, HeaderValue},
        Method, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::{normalize_origin, CorsConfig, ValidationError};
use crate::error::GatewayError;
use crate::observability::metrics;

/// Immutable CORS policy compiled from configuration.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    /// Allowed origins in serialized form (`scheme://host[:port]`, lowercase host,
    /// default port omitted), which is what browsers send.
    origins: Vec<HeaderValue>,
    methods: Vec<Method>,
    headers: Vec<HeaderName>,
    allow_credentials: bool,
    declared_methods: HeaderValue,
    declared_headers: HeaderValue,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, ValidationError> {
        let origins = config
            .allowed_origins
            .iter()
            .map(|o| {
                normalize_origin(o)
                    .and_then(|n| HeaderValue::from_str(&n).ok())
                    .ok_or_else(|| ValidationError::InvalidOrigin(o.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let methods = config
            .allowed_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                    .map_err(|_| ValidationError::InvalidMethod(m.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let headers = config
            .allowed_headers
            .iter()
            .map(|h| {
                HeaderName::from_bytes(h.as_bytes())
                    .map_err(|_| ValidationError::InvalidHeaderName(h.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let declared_methods = methods.iter().map(Method::as_str).collect::<Vec<_>>().join(",");
        let declared_methods = HeaderValue::from_str(&declared_methods)
            .map_err(|_| ValidationError::InvalidMethod(declared_methods.clone()))?;
        let declared_headers = headers.iter().map(HeaderName::as_str).collect::<Vec<_>>().join(",");
        let declared_headers = HeaderValue::from_str(&declared_headers)
            .map_err(|_| ValidationError::InvalidHeaderName(declared_headers.clone()))?;

        Ok(Self {
            origins,
            methods,
            headers,
            allow_credentials: config.allow_credentials,
            declared_methods,
            declared_headers,
        })
    }

    /// Exact membership test against the serialized allow-list.
    pub fn is_allowed(&self, origin: &HeaderValue) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    /// The header-emitting half of the policy.
    pub fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.origins.clone()))
            .allow_methods(AllowMethods::list(self.methods.clone()))
            .allow_headers(AllowHeaders::list(self.headers.clone()))
            .allow_credentials(self.allow_credentials)
    }

    /// `CorsLayer` only lists methods and headers on preflight responses;
    /// allowed cross-origin responses declare them too.
    fn declare(&self, headers: &mut HeaderMap) {
        headers
            .entry(header::ACCESS_CONTROL_ALLOW_METHODS)
            .or_insert_with(|| self.declared_methods.clone());
        headers
            .entry(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .or_insert_with(|| self.declared_headers.clone());
    }
}

/// Rejects origins that are not on the allow-list.
pub async fn origin_guard(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();

    if let Some(origin) = &origin {
        if !policy.is_allowed(origin) {
            let origin = String::from_utf8_lossy(origin.as_bytes()).into_owned();
            tracing::warn!(
                origin = %origin,
                method = %request.method(),
                path = %request.uri().path(),
                "Origin rejected"
            );
            let err = GatewayError::AccessDenied { origin };
            metrics::record_rejection(err.kind());
            return err.into_response();
        }
    }

    let preflight = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;

    if preflight {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    if origin.is_some() {
        policy.declare(response.headers_mut());
    }
    response
}
