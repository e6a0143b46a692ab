//! Proxy engine.
//!
//! # States
//! ```text
//! Preflight ──────────────────────────────────────────▶ 204
//! Gate ── rejected ───────────────────────────────────▶ 403 "blocked"
//! Normalize ── unparseable ───────────────────────────▶ 404 "url error"
//! Fetching ── no location ────────────────────────────▶ relayed response
//!    │
//!    └─ location ── known shape ──▶ rewrite to prefix ─▶ relayed redirect
//!                ── absolute URL ─▶ Fetching (follow, hop + 1)
//!                ── unparseable ──────────────────────▶ 404 "url error"
//! ```
//!
//! The first hop is always fetched with a manual redirect policy so that
//! recognised locations can be kept inside the relay. Later hops hand
//! redirect chasing to the transport.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method},
    response::Response,
};
use url::Url;

use crate::config::RelayConfig;
use crate::http::{request::is_preflight, response};
use crate::observability::metrics;
use crate::proxy::error::RelayError;
use crate::proxy::upstream::{RedirectPolicy, Upstream, UpstreamRequest};
use crate::routing::is_known_target;
use crate::security::{headers::outbound_request_headers, AllowList};

/// Request-init carried across redirect hops.
#[derive(Debug)]
pub struct ProxyState {
    pub method: Method,
    pub headers: HeaderMap,
    /// Consumed by the first hop.
    pub body: Option<Body>,
    pub redirect: RedirectPolicy,
}

impl ProxyState {
    fn request(&mut self, url: Url) -> UpstreamRequest {
        let body = self.body.take();
        let mut headers = self.headers.clone();
        // Later hops are bodiless; framing headers must go with the body.
        if body.is_none() {
            headers.remove(header::CONTENT_LENGTH);
            headers.remove(header::TRANSFER_ENCODING);
        }
        UpstreamRequest {
            method: self.method.clone(),
            url,
            headers,
            body,
            redirect: self.redirect,
        }
    }
}

/// Prepend `https://` unless the path already names http(s), then parse.
pub fn normalize_target(path: &str) -> Result<Url, RelayError> {
    let url = if path.starts_with("http://") || path.starts_with("https://") {
        Url::parse(path)
    } else {
        Url::parse(&format!("https://{path}"))
    };
    url.map_err(|_| RelayError::InvalidUrl)
}

/// Relays requests for recognised paths to their upstream.
#[derive(Clone)]
pub struct ProxyEngine {
    upstream: Arc<dyn Upstream>,
    allow_list: AllowList,
    prefix: String,
    max_redirect_hops: usize,
}

impl ProxyEngine {
    pub fn new(upstream: Arc<dyn Upstream>, config: &RelayConfig) -> Self {
        Self {
            upstream,
            allow_list: AllowList::new(config.allow_list.clone()),
            prefix: config.prefix.clone(),
            max_redirect_hops: config.max_redirect_hops,
        }
    }

    /// Relay `path` on behalf of the client request described by the other arguments.
    pub async fn handle(
        &self,
        path: &str,
        method: Method,
        headers: &HeaderMap,
        body: Body,
    ) -> Result<Response, RelayError> {
        if is_preflight(&method, headers) {
            return Ok(response::preflight());
        }

        if !self.allow_list.permits(path) {
            tracing::warn!(path = %path, "Path rejected by allow-list");
            metrics::record_blocked();
            return Err(RelayError::Blocked);
        }

        let target = normalize_target(path).inspect_err(|_| {
            tracing::warn!(path = %path, "Target is not a valid URL");
        })?;

        let state = ProxyState {
            method,
            headers: outbound_request_headers(headers),
            body: Some(body),
            redirect: RedirectPolicy::Manual,
        };
        self.relay(target, state).await
    }

    async fn relay(&self, mut target: Url, mut state: ProxyState) -> Result<Response, RelayError> {
        let mut hops = 0;
        loop {
            tracing::debug!(target = %target, policy = ?state.redirect, "Fetching upstream");
            let mut upstream = self.upstream.fetch(state.request(target)).await?;

            let Some(location) = upstream.headers().get(header::LOCATION) else {
                return Ok(response::transform(upstream));
            };
            let location = location.to_str().map_err(|_| RelayError::InvalidUrl)?;

            if is_known_target(location) {
                let rewritten = HeaderValue::from_str(&format!("{}{}", self.prefix, location))
                    .map_err(|_| RelayError::InvalidUrl)?;
                tracing::debug!(location = %location, "Keeping redirect inside the relay");
                upstream.headers_mut().insert(header::LOCATION, rewritten);
                return Ok(response::transform(upstream));
            }

            let next = Url::parse(location).map_err(|_| RelayError::InvalidUrl)?;

            hops += 1;
            if hops > self.max_redirect_hops {
                tracing::warn!(hops, location = %location, "Redirect limit exceeded");
                return Err(RelayError::RedirectLimit(self.max_redirect_hops));
            }
            tracing::debug!(hop = hops, location = %location, "Following redirect");
            metrics::record_redirect_hop();

            state.redirect = RedirectPolicy::Follow;
            target = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_prepends_https() {
        assert_eq!(
            normalize_target("github.com/foo/bar/tags").unwrap().as_str(),
            "https://github.com/foo/bar/tags"
        );
    }

    #[test]
    fn normalize_keeps_explicit_scheme() {
        assert_eq!(
            normalize_target("http://github.com/foo/bar/tags").unwrap().as_str(),
            "http://github.com/foo/bar/tags"
        );
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert!(matches!(
            normalize_target("not a url \x00"),
            Err(RelayError::InvalidUrl)
        ));
        assert!(matches!(normalize_target(""), Err(RelayError::InvalidUrl)));
    }
}
