//! HTTP server setup and dispatch.
//!
//! # Responsibilities
//! - Build the route table and request pipeline from configuration
//! - Dispatch requests to the collaborator selected by the route table
//! - Bound every collaborator call with the upstream timeout
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::collaborator::{http_client, CollaboratorError};
use crate::config::{validate_config, ConfigError, GatewayConfig};
use crate::error::GatewayError;
use crate::http::pipeline::Pipeline;
use crate::observability::metrics;
use crate::routing::RouteTable;

/// Application state injected into the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub upstream_timeout: Duration,
}

/// Errors building the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Route table: {0}")]
    Routes(#[from] CollaboratorError),
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: Arc<GatewayConfig>,
    routes: Arc<RouteTable>,
}

impl GatewayServer {
    /// Create a server forwarding to the upstreams named in `config.routes`.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let client = http_client(&config.timeouts);
        let routes = RouteTable::from_config(&config.routes, client)?;
        Self::with_routes(config, routes)
    }

    /// Create a server over an already-built route table.
    ///
    /// `config.routes` is ignored.
    pub fn with_routes(config: GatewayConfig, routes: RouteTable) -> Result<Self, StartupError> {
        let pipeline = Pipeline::from_config(&config)
            .map_err(|e| ConfigError::Validation(vec![e]))?;

        let routes = Arc::new(routes);
        let state = AppState {
            routes: routes.clone(),
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
        };

        let router = pipeline.wrap(Router::new().fallback(dispatch).with_state(state));

        Ok(Self {
            router,
            config: Arc::new(config),
            routes,
        })
    }

    /// The fully assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes.len(),
            shadowed = ?self.routes.shadowed(),
            identity_placeholder = self.config.identity.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}

/// Looks up the route and hands the request to its collaborator.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let Some(route) = state.routes.match_path(&path) else {
        tracing::warn!(path = %path, "No route matched");
        let err = GatewayError::NoRoute { path };
        metrics::record_rejection(err.kind());
        return err.into_response();
    };

    tracing::debug!(
        route = %route.name,
        collaborator = %route.collaborator.name(),
        "Dispatching request"
    );

    let outcome = tokio::time::timeout(state.upstream_timeout, route.collaborator.call(request)).await;

    let err = match outcome {
        Ok(Ok(response)) => {
            let status = response.status();
            metrics::record_request(&method, status.as_u16(), &route.name, start);
            tracing::debug!(route = %route.name, status = %status, "Collaborator responded");
            return response;
        }
        Ok(Err(e)) => GatewayError::CollaboratorUnreachable {
            collaborator: route.collaborator.name().to_string(),
            reason: e.to_string(),
        },
        Err(_) => GatewayError::CollaboratorTimeout {
            collaborator: route.collaborator.name().to_string(),
            secs: state.upstream_timeout.as_secs(),
        },
    };

    tracing::error!(route = %route.name, error = %err, "Collaborator call failed");
    metrics::record_request(&method, err.status().as_u16(), &route.name, start);
    err.into_response()
}
