//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overlay: PORT, CORS_ALLOWED_ORIGINS, ...)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc with the request pipeline
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never mutated afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, load_config, load_with, ConfigError};
pub use schema::{
    BodyConfig, CorsConfig, GatewayConfig, IdentityConfig, ListenerConfig, ObservabilityConfig,
    RouteConfig, TimeoutConfig,
};
pub use validation::{normalize_origin, validate_config, ValidationError};
