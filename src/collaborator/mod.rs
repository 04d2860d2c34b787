//! Downstream collaborators.
//!
//! # Data Flow
//! ```text
//! Route matched → collaborator selected
//!     → upstream.rs (rewrite URI, strip hop-by-hop headers)
//!     → hyper client (forward request)
//!     → response returned verbatim
//! ```
//!
//! # Design Decisions
//! - Collaborators are opaque HTTP peers behind a trait object, so the
//!   route table doesn't care whether a handler is remote or in-process
//! - No retries; failures surface to the caller as-is
//! - Deadlines are enforced by the dispatcher, not the collaborator

pub mod upstream;

use std::fmt;

use axum::{body::Body, http::Request, response::Response};
use futures_util::future::BoxFuture;
use thiserror::Error;

pub use upstream::{http_client, HttpClient, UpstreamCollaborator};

/// Future returned by [`Collaborator::call`].
pub type CollaboratorFuture = BoxFuture<'static, Result<Response, CollaboratorError>>;

/// A handler mounted under a route prefix.
pub trait Collaborator: Send + Sync + fmt::Debug {
    /// Name used in logs and metrics.
    fn name(&self) -> &str;

    /// Handle a request that matched this collaborator's route.
    fn call(&self, request: Request<Body>) -> CollaboratorFuture;
}

/// Errors raised while talking to a collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The upstream base URL or rewritten URI is invalid.
    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),

    /// Connection refused, reset, DNS failure and the like.
    #[error("{0}")]
    Unreachable(String),
}
