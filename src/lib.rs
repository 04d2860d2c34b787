//! Customer Portal API Gateway Library
//!
//! A single HTTP entry point for the customer portal: enforces the CORS
//! allow-list, parses JSON bodies, stamps a development identity header, and
//! forwards each request to the collaborator mounted under the matching
//! URL prefix.

pub mod collaborator;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
