//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, RouteConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables consulted by [`apply_env`].
pub const ENV_PORT: &str = "PORT";
pub const ENV_HOST: &str = "GATEWAY_HOST";
pub const ENV_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
pub const ENV_DEV_IDENTITY: &str = "GATEWAY_DEV_IDENTITY";
pub const ENV_AUTH_SERVICE: &str = "AUTH_SERVICE_URL";
pub const ENV_CUSTOMER_SERVICE: &str = "CUSTOMER_SERVICE_URL";
pub const ENV_EMPLOYEE_SERVICE: &str = "EMPLOYEE_SERVICE_URL";

const DEFAULT_AUTH_SERVICE: &str = "http://127.0.0.1:8081";
const DEFAULT_CUSTOMER_SERVICE: &str = "http://127.0.0.1:8082/api";
const DEFAULT_EMPLOYEE_SERVICE: &str = "http://127.0.0.1:8083";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: `{value}`")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML configuration file without validating it.
pub fn read_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the startup configuration: optional file, then process environment,
/// then validation. A missing route table falls back to the portal routes.
pub fn load(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    load_with(path, |key| std::env::var(key).ok())
}

/// [`load`] with an explicit environment lookup.
pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };

    // Before the overlay, so *_SERVICE_URL can repoint the built-in routes.
    if config.routes.is_empty() {
        config.routes = GatewayConfig::portal_routes(
            DEFAULT_AUTH_SERVICE,
            DEFAULT_CUSTOMER_SERVICE,
            DEFAULT_EMPLOYEE_SERVICE,
        );
        tracing::debug!("No routes configured, using portal route table");
    }

    apply_env(&mut config, lookup)?;

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so tests don't mutate process state.
pub fn apply_env<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(port) = lookup(ENV_PORT) {
        config.listener.port = port.trim().parse().map_err(|_| ConfigError::Env {
            var: ENV_PORT,
            value: port.clone(),
        })?;
    }

    if let Some(host) = lookup(ENV_HOST) {
        config.listener.host = host.trim().to_string();
    }

    if let Some(origins) = lookup(ENV_ALLOWED_ORIGINS) {
        config.cors.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }

    if let Some(flag) = lookup(ENV_DEV_IDENTITY) {
        config.identity.enabled = match flag.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                return Err(ConfigError::Env {
                    var: ENV_DEV_IDENTITY,
                    value: flag,
                })
            }
        };
    }

    for (var, name) in [
        (ENV_AUTH_SERVICE, "auth"),
        (ENV_CUSTOMER_SERVICE, "customer"),
        (ENV_EMPLOYEE_SERVICE, "employee"),
    ] {
        if let Some(upstream) = lookup(var) {
            set_upstream(&mut config.routes, name, upstream.trim());
        }
    }

    Ok(())
}

/// Point the named route at `upstream`; leaves other routes alone.
fn set_upstream(routes: &mut [RouteConfig], name: &str, upstream: &str) {
    for route in routes.iter_mut().filter(|r| r.name == name) {
        route.upstream = upstream.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overlay() {
        let mut config = GatewayConfig {
            routes: GatewayConfig::portal_routes("http://a", "http://c/api", "http://e"),
            ..GatewayConfig::default()
        };

        apply_env(
            &mut config,
            env(&[
                (ENV_PORT, "4100"),
                (ENV_ALLOWED_ORIGINS, "http://localhost:3000, https://portal.example.com,"),
                (ENV_DEV_IDENTITY, "true"),
                (ENV_CUSTOMER_SERVICE, "http://customer:9000/api"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.port, 4100);
        assert_eq!(
            config.cors.allowed_origins,
            vec!["http://localhost:3000", "https://portal.example.com"]
        );
        assert!(config.identity.enabled);
        assert_eq!(config.routes[0].upstream, "http://a");
        assert_eq!(config.routes[1].upstream, "http://customer:9000/api");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = GatewayConfig::default();
        apply_env(&mut config, env(&[(ENV_PORT, ""), (ENV_ALLOWED_ORIGINS, " ")])).unwrap();
        assert_eq!(config.listener.port, 4000);
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_bad_env_values() {
        let mut config = GatewayConfig::default();
        let err = apply_env(&mut config, env(&[(ENV_PORT, "four thousand")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: ENV_PORT, .. }));

        let err = apply_env(&mut config, env(&[(ENV_DEV_IDENTITY, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: ENV_DEV_IDENTITY, .. }));
    }

    #[test]
    fn test_service_urls_repoint_builtin_routes() {
        let config = load_with(
            None,
            env(&[
                (ENV_AUTH_SERVICE, "http://auth-override:9001"),
                (ENV_CUSTOMER_SERVICE, "http://customer-override:9000/api"),
            ]),
        )
        .unwrap();

        let upstream = |name: &str| {
            config
                .routes
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.upstream.clone())
                .unwrap()
        };
        assert_eq!(upstream("auth"), "http://auth-override:9001");
        assert_eq!(upstream("customer"), "http://customer-override:9000/api");
        assert_eq!(upstream("employee"), DEFAULT_EMPLOYEE_SERVICE);
    }

    #[test]
    fn test_load_without_env_uses_portal_defaults() {
        let config = load_with(None, env(&[])).unwrap();
        assert_eq!(config.routes.len(), 3);
        assert_eq!(config.routes[1].upstream, DEFAULT_CUSTOMER_SERVICE);
        assert!(!config.identity.enabled);
    }

    #[test]
    fn test_load_config_reports_validation() {
        let dir = std::env::temp_dir().join(format!("portal-gateway-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        fs::write(
            &path,
            r#"
            [[routes]]
            name = "customer"
            path_prefix = "/api/customer/"
            upstream = "http://127.0.0.1:8082"
            "#,
        )
        .unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().starts_with("Validation failed: "));

        let _ = fs::remove_dir_all(&dir);
    }
}
