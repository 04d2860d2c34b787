//! Request pipeline stages.

pub mod cors;
pub mod identity;
pub mod json_body;

pub use cors::{origin_guard, CorsPolicy};
pub use identity::{identity_middleware, IdentityPolicy};
pub use json_body::{json_body_middleware, BodyPolicy, JsonBody};
