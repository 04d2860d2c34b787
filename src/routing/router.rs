//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for a request path
//! - Return matched route or explicit no-match
//!
//! # Precedence
//! Routes are ordered by priority (higher first), then by prefix
//! specificity (more segments first), then by registration order. The first
//! route in that order whose prefix matches wins, so two registrations with
//! the same prefix and priority always resolve to the one registered first.
//! Any route preceded by an identical prefix is reported as shadowed when the
//! table is built.

use std::sync::Arc;

use crate::collaborator::{Collaborator, CollaboratorError, HttpClient, UpstreamCollaborator};
use crate::config::RouteConfig;
use crate::routing::matcher::PathPrefix;

/// A mounted collaborator.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pub prefix: PathPrefix,
    pub priority: u32,
    pub collaborator: Arc<dyn Collaborator>,
}

/// Immutable, precedence-ordered route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    shadowed: Vec<String>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Build the table from configuration, forwarding over `client`.
    pub fn from_config(
        routes: &[RouteConfig],
        client: HttpClient,
    ) -> Result<Self, CollaboratorError> {
        let mut builder = Self::builder();
        for route in routes {
            let collaborator = UpstreamCollaborator::new(route, client.clone())?;
            builder = builder.mount(
                &route.name,
                &route.path_prefix,
                route.priority,
                Arc::new(collaborator),
            );
        }
        Ok(builder.build())
    }

    /// Find the route for `path`.
    pub fn match_path(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.prefix.matches(path))
    }

    /// Routes in evaluation order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Names of routes that can never be selected.
    pub fn shadowed(&self) -> &[String] {
        &self.shadowed
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Collects routes in registration order.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: Vec<Route>,
}

impl RouteTableBuilder {
    /// Register `collaborator` under `prefix`.
    pub fn mount(
        mut self,
        name: &str,
        prefix: &str,
        priority: u32,
        collaborator: Arc<dyn Collaborator>,
    ) -> Self {
        self.routes.push(Route {
            name: name.to_string(),
            prefix: PathPrefix::new(prefix),
            priority,
            collaborator,
        });
        self
    }

    /// Freeze the table. The sort is stable, which keeps registration order
    /// among equal routes.
    pub fn build(mut self) -> RouteTable {
        self.routes.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.prefix.segments().cmp(&a.prefix.segments()))
        });

        let mut shadowed = Vec::new();
        for (i, route) in self.routes.iter().enumerate() {
            let winner = self.routes[..i]
                .iter()
                .find(|earlier| earlier.prefix == route.prefix);
            if let Some(winner) = winner {
                tracing::warn!(
                    route = %route.name,
                    prefix = %route.prefix.as_str(),
                    selected = %winner.name,
                    "Route is shadowed by an earlier registration with the same prefix"
                );
                shadowed.push(route.name.clone());
            }
        }

        for route in &self.routes {
            tracing::debug!(
                route = %route.name,
                prefix = %route.prefix.as_str(),
                priority = route.priority,
                collaborator = %route.collaborator.name(),
                "Route mounted"
            );
        }

        RouteTable {
            routes: self.routes,
            shadowed,
        }
    }
}
