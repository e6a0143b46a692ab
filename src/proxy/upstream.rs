//! Upstream HTTP exchange.
//!
//! The engine talks to the network only through [`Upstream`], so the
//! transport can be swapped in tests. [`HttpUpstream`] is the reqwest-backed
//! implementation used by the server.

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{Body, HttpBody},
    http::{HeaderMap, Method, Response},
};
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

use crate::security::headers::strip_hop_by_hop;

/// Whether the transport may follow redirects on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPolicy {
    /// Return 3xx responses as-is so the engine can inspect `location`.
    Manual,
    /// Let the transport chase redirects.
    Follow,
}

/// A single outbound request.
#[derive(Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// Streamed request body, if any.
    pub body: Option<Body>,
    pub redirect: RedirectPolicy,
}

impl UpstreamRequest {
    /// Plain GET with no headers or body.
    pub fn get(url: Url, redirect: RedirectPolicy) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
            redirect,
        }
    }
}

/// Transport-level failure: no upstream response exists.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed")]
    Transport(#[from] reqwest::Error),
}

/// Something that can perform an upstream HTTP exchange.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, request: UpstreamRequest) -> Result<Response<Body>, UpstreamError>;
}

/// reqwest-backed upstream with one client per redirect policy.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    manual: reqwest::Client,
    follow: reqwest::Client,
}

impl HttpUpstream {
    /// Build clients; the following client stops after `max_redirects` hops.
    pub fn new(connect_timeout: Duration, max_redirects: usize) -> Result<Self, UpstreamError> {
        let manual = reqwest::Client::builder()
            .redirect(Policy::none())
            .connect_timeout(connect_timeout)
            .build()?;
        let follow = reqwest::Client::builder()
            .redirect(Policy::limited(max_redirects))
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { manual, follow })
    }

    fn client(&self, policy: RedirectPolicy) -> &reqwest::Client {
        match policy {
            RedirectPolicy::Manual => &self.manual,
            RedirectPolicy::Follow => &self.follow,
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, request: UpstreamRequest) -> Result<Response<Body>, UpstreamError> {
        let mut builder = self
            .client(request.redirect)
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(body) = request.body.filter(|b| !b.is_end_stream()) {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = builder.send().await?;

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
