//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check that origins, methods, header names and upstream URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Identical route prefixes are legal; the router reports shadowed routes

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route #{index} has an empty name")]
    EmptyRouteName { index: usize },

    #[error("route name `{0}` is used more than once")]
    DuplicateRouteName(String),

    #[error("route `{route}`: prefix `{prefix}` must start with '/' and not end with '/'")]
    InvalidPrefix { route: String, prefix: String },

    #[error("route `{route}`: upstream `{upstream}` is not an absolute http URL: {reason}")]
    InvalidUpstream {
        route: String,
        upstream: String,
        reason: String,
    },

    #[error("origin `{0}` must be scheme://host[:port]")]
    InvalidOrigin(String),

    #[error("wildcard origin is not allowed; list origins explicitly")]
    WildcardOrigin,

    #[error("`{0}` is not a valid HTTP method")]
    InvalidMethod(String),

    #[error("`{0}` is not a valid header name")]
    InvalidHeaderName(String),

    #[error("identity placeholder `{0}` is not a valid header value")]
    InvalidPlaceholder(String),

    #[error("metrics address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut names = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName { index });
        } else if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        if !is_valid_prefix(&route.path_prefix) {
            errors.push(ValidationError::InvalidPrefix {
                route: route.name.clone(),
                prefix: route.path_prefix.clone(),
            });
        }

        if let Err(reason) = check_upstream(&route.upstream) {
            errors.push(ValidationError::InvalidUpstream {
                route: route.name.clone(),
                upstream: route.upstream.clone(),
                reason,
            });
        }
    }

    for origin in &config.cors.allowed_origins {
        if origin == "*" {
            errors.push(ValidationError::WildcardOrigin);
        } else if normalize_origin(origin).is_none() {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    for method in &config.cors.allowed_methods {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod(method.clone()));
        }
    }

    for header in config
        .cors
        .allowed_headers
        .iter()
        .chain(std::iter::once(&config.identity.header))
    {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(header.clone()));
        }
    }

    if HeaderValue::from_str(&config.identity.placeholder).is_err() {
        errors.push(ValidationError::InvalidPlaceholder(
            config.identity.placeholder.clone(),
        ));
    }

    if config
        .observability
        .metrics_address
        .parse::<SocketAddr>()
        .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.body.max_bytes == 0 {
        errors.push(ValidationError::Zero("body.max_bytes"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.upstream_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    prefix == "/" || (prefix.starts_with('/') && !prefix.ends_with('/'))
}

fn check_upstream(upstream: &str) -> Result<(), String> {
    let url = Url::parse(upstream).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() {
        return Err("query strings are not allowed".to_string());
    }
    Ok(())
}

/// Serialize an allow-list entry the way browsers send `Origin`: lowercase
/// scheme and host, default port dropped. `None` if it is not
/// `scheme://host[:port]`.
pub fn normalize_origin(origin: &str) -> Option<String> {
    if HeaderValue::from_str(origin).is_err() || origin.ends_with('/') {
        return None;
    }
    // Url normalizes an empty path to "/", hence the trailing-slash check above.
    let url = Url::parse(origin).ok()?;
    if url.host_str().is_none()
        || url.query().is_some()
        || url.fragment().is_some()
        || url.path() != "/"
        || !url.username().is_empty()
    {
        return None;
    }
    Some(url.origin().ascii_serialization())
}
