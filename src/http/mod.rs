//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, graceful shutdown)
//!     → pipeline.rs (request id, trace, CORS, JSON body, identity)
//!     → server.rs dispatch (route lookup, collaborator call with deadline)
//!     → collaborator response, returned verbatim
//! ```

pub mod middleware;
pub mod pipeline;
pub mod request;
pub mod server;

pub use pipeline::Pipeline;
pub use request::X_REQUEST_ID;
pub use server::{GatewayServer, StartupError};
