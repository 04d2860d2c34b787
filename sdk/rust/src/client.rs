//! Client for the customer portal gateway.
//!
//! Mirrors what the portal frontend expects from the gateway: JSON on
//! success, nothing on `204`, and a single error value carrying the status
//! line and body text for everything else.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Primary environment variable holding the gateway base URL.
pub const API_BASE_ENV: &str = "PORTAL_API_BASE";
/// Fallback environment variable holding the gateway base URL.
pub const GATEWAY_URL_ENV: &str = "PORTAL_GATEWAY_URL";
/// Base URL used when neither variable is set.
pub const DEFAULT_API_BASE: &str = "http://localhost:4000";

/// Resolve the gateway base URL from the environment.
pub fn resolve_api_base() -> String {
    resolve_from(
        std::env::var(API_BASE_ENV).ok(),
        std::env::var(GATEWAY_URL_ENV).ok(),
    )
}

fn resolve_from(primary: Option<String>, fallback: Option<String>) -> String {
    let base = [primary, fallback]
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    base.trim_end_matches('/').to_string()
}

/// A successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Borrow the JSON value, if the response was JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            Payload::Text(_) => None,
        }
    }
}

/// Errors returned by [`PortalClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The gateway answered with a non-2xx status.
    #[error("{status} {status_text}{}", body_suffix(.body))]
    Status {
        status: u16,
        status_text: String,
        body: String,
    },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response declared JSON but did not contain it.
    #[error("invalid JSON in response: {0}")]
    Decode(#[from] serde_json::Error),
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" - {}", body)
    }
}

impl ApiError {
    /// HTTP status, when the gateway responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// HTTP client for the portal gateway.
#[derive(Debug, Clone)]
pub struct PortalClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl PortalClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Client pointed at the base URL resolved from the environment.
    pub fn from_env() -> Self {
        Self::new(&resolve_api_base())
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.is_empty() { None } else { Some(token) };
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request to `path` (relative to the base URL).
    ///
    /// Returns `Ok(None)` for `204 No Content`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Payload>, ApiError> {
        let mut headers = HeaderMap::new();
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .headers(headers);
        if let Some(body) = body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let res = builder.send().await?;
        let status = res.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let is_json = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);

        if status.is_success() {
            let text = res.text().await?;
            return if is_json {
                Ok(Some(Payload::Json(serde_json::from_str(&text)?)))
            } else {
                Ok(Some(Payload::Text(text)))
            };
        }

        // Body is best effort on the error path.
        let body = res.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }

    pub async fn get(&self, path: &str) -> Result<Option<Payload>, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Option<Payload>, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Option<Payload>, ApiError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<Option<Payload>, ApiError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Option<Payload>, ApiError> {
        self.request(Method::DELETE, path, None).await
    }

    /// Vehicles registered to the current customer.
    pub async fn vehicles(&self) -> Result<Option<Payload>, ApiError> {
        self.get("/api/customer/vehicles").await
    }

    /// Service history of the current customer.
    pub async fn history(&self) -> Result<Option<Payload>, ApiError> {
        self.get("/api/customer/history").await
    }

    /// Profile of the current customer.
    pub async fn me(&self) -> Result<Option<Payload>, ApiError> {
        self.get("/api/customer/customers/me").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus},
        routing::get,
        Json, Router,
    };

    #[test]
    fn test_resolve_prefers_primary() {
        let base = resolve_from(Some("http://a:1".into()), Some("http://b:2".into()));
        assert_eq!(base, "http://a:1");
    }

    #[test]
    fn test_resolve_falls_back() {
        assert_eq!(resolve_from(None, Some("http://b:2/".into())), "http://b:2");
        assert_eq!(resolve_from(Some("  ".into()), Some("http://b:2".into())), "http://b:2");
        assert_eq!(resolve_from(None, None), DEFAULT_API_BASE);
    }

    #[test]
    fn test_status_error_message() {
        let err = ApiError::Status {
            status: 404,
            status_text: "Not Found".into(),
            body: "no such vehicle".into(),
        };
        assert_eq!(err.to_string(), "404 Not Found - no such vehicle");
        assert!(err.is_not_found());

        let err = ApiError::Status {
            status: 500,
            status_text: "Internal Server Error".into(),
            body: String::new(),
        };
        assert_eq!(err.to_string(), "500 Internal Server Error");
        assert!(!err.is_not_found());
    }

    async fn spawn_server() -> String {
        let app = Router::new()
            .route(
                "/api/customer/vehicles",
                get(|headers: AxumHeaders| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    Json(serde_json::json!({ "auth": auth }))
                }),
            )
            .route("/empty", get(|| async { AxumStatus::NO_CONTENT }))
            .route("/text", get(|| async { "plain" }))
            .route(
                "/missing",
                get(|| async { (AxumStatus::NOT_FOUND, "customer not found") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_request_outcomes() {
        let base = spawn_server().await;
        let client = PortalClient::new(&base).with_token("abc.def");

        let vehicles = client.vehicles().await.unwrap().unwrap();
        assert_eq!(
            vehicles.as_json().unwrap()["auth"],
            serde_json::json!("Bearer abc.def")
        );

        assert_eq!(client.get("/empty").await.unwrap(), None);
        assert_eq!(
            client.get("/text").await.unwrap(),
            Some(Payload::Text("plain".into()))
        );

        let err = client.get("/missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "404 Not Found - customer not found");
    }
}
