//! HTTP forwarding to an upstream service.

use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header::{self, HeaderMap, HeaderName},
        uri::{Authority, PathAndQuery, Scheme},
        Request, Uri, Version,
    },
    response::Response,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::{Position, Url};

use crate::collaborator::{Collaborator, CollaboratorError, CollaboratorFuture};
use crate::config::{RouteConfig, TimeoutConfig};
use crate::routing::PathPrefix;

/// Client shared by every upstream collaborator.
pub type HttpClient = Client<HttpConnector, Body>;

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Build the HTTP client used for all collaborators.
pub fn http_client(timeouts: &TimeoutConfig) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
    Client::builder(TokioExecutor::new()).build(connector)
}

/// Forwards requests to `upstream`, optionally stripping the mount prefix.
#[derive(Debug, Clone)]
pub struct UpstreamCollaborator {
    name: String,
    prefix: PathPrefix,
    strip_prefix: bool,
    authority: Authority,
    base_path: String,
    client: HttpClient,
}

impl UpstreamCollaborator {
    pub fn new(route: &RouteConfig, client: HttpClient) -> Result<Self, CollaboratorError> {
        let invalid = |reason: String| {
            CollaboratorError::InvalidTarget(format!("{} ({})", route.upstream, reason))
        };

        let url = Url::parse(&route.upstream).map_err(|e| invalid(e.to_string()))?;
        if url.scheme() != "http" {
            return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
        }
        let authority: Authority = url[Position::BeforeHost..Position::AfterPort]
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| invalid(e.to_string()))?;

        Ok(Self {
            name: route.name.clone(),
            prefix: PathPrefix::new(route.path_prefix.as_str()),
            strip_prefix: route.strip_prefix,
            authority,
            base_path: url.path().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Rewrite an inbound URI to its upstream target.
    pub fn target_uri(&self, uri: &Uri) -> Result<Uri, CollaboratorError> {
        let path = uri.path();
        let rest = if self.strip_prefix {
            self.prefix.strip(path).unwrap_or(path)
        } else {
            path
        };

        // The bare mount point maps to the bare base path; a trailing slash is kept.
        let mut target = if rest == "/" && !self.base_path.is_empty() && !path.ends_with('/') {
            self.base_path.clone()
        } else {
            format!("{}{}", self.base_path, rest)
        };
        if let Some(query) = uri.query() {
            target.push('?');
            target.push_str(query);
        }

        let path_and_query: PathAndQuery = target
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| CollaboratorError::InvalidTarget(e.to_string()))?;

        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| CollaboratorError::InvalidTarget(e.to_string()))
    }
}

impl Collaborator for UpstreamCollaborator {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, request: Request<Body>) -> CollaboratorFuture {
        let (mut parts, body) = request.into_parts();
        let target = self.target_uri(&parts.uri);
        let client = self.client.clone();
        let name = self.name.clone();

        Box::pin(async move {
            parts.uri = target?;
            parts.version = Version::HTTP_11;
            strip_hop_by_hop(&mut parts.headers);
            // The client derives Host from the target URI.
            parts.headers.remove(header::HOST);

            tracing::debug!(collaborator = %name, uri = %parts.uri, "Forwarding request");

            let response = client
                .request(Request::from_parts(parts, body))
                .await
                .map_err(|e| CollaboratorError::Unreachable(e.to_string()))?;

            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Ok(Response::from_parts(parts, Body::new(body)))
        })
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}
