//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Cross-origin access policy.
    pub cors: CorsConfig,

    /// JSON body parsing.
    pub body: BodyConfig,

    /// Development identity header stamping.
    pub identity: IdentityConfig,

    /// Route definitions mapping URL prefixes to collaborators.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// Route table of the customer portal: auth, customer, and an employee
    /// group mounted under the same prefix as auth.
    pub fn portal_routes(auth: &str, customer: &str, employee: &str) -> Vec<RouteConfig> {
        vec![
            RouteConfig::new("auth", "/api/auth", auth),
            RouteConfig::new("customer", "/api/customer", customer),
            RouteConfig::new("employee", "/api/auth", employee),
        ]
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// TCP port.
    pub port: u16,
}

impl ListenerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
        }
    }
}

/// CORS policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to make cross-origin requests (exact match).
    pub allowed_origins: Vec<String>,

    /// Methods announced in `Access-Control-Allow-Methods`.
    pub allowed_methods: Vec<String>,

    /// Headers announced in `Access-Control-Allow-Headers`.
    pub allowed_headers: Vec<String>,

    /// Announce `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            allow_credentials: true,
        }
    }
}

/// JSON body parsing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Maximum JSON body size in bytes.
    pub max_bytes: usize,

    /// Only accept objects and arrays at the top level.
    pub strict: bool,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024,
            strict: true,
        }
    }
}

/// Placeholder identity stamping.
///
/// Development convenience only. Collaborators must not treat the header
/// as proof of identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Inject the placeholder when the header is missing.
    pub enabled: bool,

    /// Header carrying the caller identity.
    pub header: String,

    /// Value injected when the header is missing.
    pub placeholder: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            header: "x-user-id".to_string(),
            placeholder: "demo-user".to_string(),
        }
    }
}

/// Route configuration mapping a URL prefix to a collaborator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Mount prefix (segment-aware match).
    pub path_prefix: String,

    /// Collaborator base URL, e.g. "http://127.0.0.1:8082/api".
    pub upstream: String,

    /// Remove the mount prefix before appending the path to `upstream`.
    #[serde(default = "default_strip_prefix")]
    pub strip_prefix: bool,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
}

impl RouteConfig {
    pub fn new(name: &str, path_prefix: &str, upstream: &str) -> Self {
        Self {
            name: name.to_string(),
            path_prefix: path_prefix.to_string(),
            upstream: upstream.to_string(),
            strip_prefix: default_strip_prefix(),
            priority: 0,
        }
    }
}

fn default_strip_prefix() -> bool {
    true
}

/// Timeout configuration for collaborator calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time allowed for a collaborator to respond, in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9100".to_string(),
        }
    }
}
