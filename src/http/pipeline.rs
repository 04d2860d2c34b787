//! The fixed request pipeline.
//!
//! Stages run in this order on every request and are assembled once, before
//! the listener accepts connections:
//!
//! ```text
//! set x-request-id → trace span → propagate x-request-id
//!     → origin guard (reject) → CorsLayer (answer preflight, CORS headers)
//!     → JSON body (reject malformed)
//!     → identity header
//!     → dispatch
//! ```

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Router};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, ValidationError};
use crate::http::middleware::{
    identity_middleware, json_body_middleware, origin_guard, BodyPolicy, CorsPolicy,
    IdentityPolicy,
};
use crate::http::request::{request_span, UuidRequestId, X_REQUEST_ID};

/// Compiled, immutable policies for each pipeline stage.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub cors: Arc<CorsPolicy>,
    pub body: Arc<BodyPolicy>,
    pub identity: Arc<IdentityPolicy>,
}

impl Pipeline {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ValidationError> {
        Ok(Self {
            cors: Arc::new(CorsPolicy::from_config(&config.cors)?),
            body: Arc::new(BodyPolicy::from(&config.body)),
            identity: Arc::new(IdentityPolicy::from_config(&config.identity)?),
        })
    }

    /// Wrap `router` in every stage. `ServiceBuilder` applies layers top to
    /// bottom, so the listing below is the request order.
    pub fn wrap(self, router: Router) -> Router {
        let cors_layer = self.cors.layer();
        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(from_fn_with_state(self.cors, origin_guard))
                .layer(cors_layer)
                .layer(from_fn_with_state(self.body, json_body_middleware))
                .layer(from_fn_with_state(self.identity, identity_middleware)),
        )
    }
}
