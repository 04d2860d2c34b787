//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use portal_gateway::collaborator::{Collaborator, CollaboratorError, CollaboratorFuture};
use portal_gateway::config::{GatewayConfig, RouteConfig};
use portal_gateway::http::middleware::JsonBody;
use portal_gateway::routing::RouteTable;
use portal_gateway::{GatewayServer, Shutdown};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const PORTAL_ORIGIN: &str = "http://localhost:3000";

/// What a collaborator saw of one request.
#[derive(Debug, Clone)]
pub struct Observed {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub json: Option<Value>,
}

/// In-process collaborator that records every call and answers with a
/// fixed status and body.
#[derive(Debug)]
pub struct RecordingCollaborator {
    name: String,
    status: StatusCode,
    body: Value,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<Observed>>>,
}

impl RecordingCollaborator {
    pub fn new(name: &str) -> Arc<Self> {
        Self::responding(name, StatusCode::OK, json!({ "collaborator": name }))
    }

    pub fn responding(name: &str, status: StatusCode, body: Value) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            status,
            body,
            delay: None,
            calls: Arc::default(),
        })
    }

    pub fn slow(name: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            status: StatusCode::OK,
            body: json!({ "collaborator": name }),
            delay: Some(delay),
            calls: Arc::default(),
        })
    }

    pub fn calls(&self) -> Vec<Observed> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Collaborator for RecordingCollaborator {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, request: Request<Body>) -> CollaboratorFuture {
        let calls = self.calls.clone();
        let status = self.status;
        let body = self.body.clone();
        let delay = self.delay;

        Box::pin(async move {
            let (parts, req_body) = request.into_parts();
            let bytes = axum::body::to_bytes(req_body, usize::MAX)
                .await
                .map_err(|e| CollaboratorError::Unreachable(e.to_string()))?;
            calls.lock().unwrap().push(Observed {
                method: parts.method.clone(),
                path: parts.uri.path().to_string(),
                headers: parts.headers.clone(),
                body: bytes,
                json: parts.extensions.get::<JsonBody>().map(|b| b.0.clone()),
            });

            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok((status, Json(body)).into_response())
        })
    }
}

/// The three portal collaborators, mounted the way the portal mounts them.
pub struct Portal {
    pub auth: Arc<RecordingCollaborator>,
    pub customer: Arc<RecordingCollaborator>,
    pub employee: Arc<RecordingCollaborator>,
}

impl Portal {
    pub fn new() -> Self {
        Self {
            auth: RecordingCollaborator::new("auth"),
            customer: RecordingCollaborator::new("customer"),
            employee: RecordingCollaborator::new("employee"),
        }
    }

    pub fn table(&self) -> RouteTable {
        RouteTable::builder()
            .mount("auth", "/api/auth", 0, self.auth.clone())
            .mount("customer", "/api/customer", 0, self.customer.clone())
            .mount("employee", "/api/auth", 0, self.employee.clone())
            .build()
    }

    pub fn total_calls(&self) -> usize {
        self.auth.call_count() + self.customer.call_count() + self.employee.call_count()
    }
}

/// Development configuration: identity placeholder on.
pub fn dev_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.identity.enabled = true;
    config
}

/// In-process gateway router over `table`.
pub fn gateway(config: GatewayConfig, table: RouteTable) -> Router {
    GatewayServer::with_routes(config, table).unwrap().router()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Start a loopback backend that echoes what it received as JSON.
///
/// `/api/empty` answers 204, `/api/missing` answers 404 with a text body.
pub async fn start_echo_backend() -> SocketAddr {
    async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
        match uri.path() {
            "/api/empty" => return StatusCode::NO_CONTENT.into_response(),
            "/api/missing" => {
                return (StatusCode::NOT_FOUND, "customer not found").into_response()
            }
            _ => {}
        }
        let value_of = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "authorization": value_of(header::AUTHORIZATION),
            "user_id": value_of(header::HeaderName::from_static("x-user-id")),
            "body": String::from_utf8_lossy(&body),
        }))
        .into_response()
    }

    let app = Router::new().fallback(echo);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start a gateway on a loopback port. Trigger the returned `Shutdown` to stop it.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = GatewayServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

/// Dev config forwarding the portal prefixes to loopback backends.
pub fn forwarding_config(auth: SocketAddr, customer: SocketAddr) -> GatewayConfig {
    let mut config = dev_config();
    config.routes = vec![
        RouteConfig::new("auth", "/api/auth", &format!("http://{}", auth)),
        RouteConfig::new("customer", "/api/customer", &format!("http://{}/api", customer)),
    ];
    config
}
