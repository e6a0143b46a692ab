//! Static-asset fallback.
//!
//! Paths that match no upstream shape are appended to the asset origin and
//! fetched as-is. The landing page, its service worker and client config all
//! come from there. The answer is returned without any header rewriting.

use std::sync::Arc;

use axum::response::Response;
use url::Url;

use crate::proxy::error::RelayError;
use crate::proxy::upstream::{RedirectPolicy, Upstream, UpstreamRequest};

#[derive(Clone)]
pub struct StaticAssets {
    upstream: Arc<dyn Upstream>,
    base: String,
}

impl StaticAssets {
    pub fn new(upstream: Arc<dyn Upstream>, base: impl Into<String>) -> Self {
        Self {
            upstream,
            base: base.into(),
        }
    }

    /// URL that `path` is served from.
    pub fn url_for(&self, path: &str) -> Result<Url, RelayError> {
        Ok(Url::parse(&format!("{}{}", self.base, path))?)
    }

    pub async fn fetch(&self, path: &str) -> Result<Response, RelayError> {
        let url = self.url_for(path)?;
        tracing::debug!(url = %url, "Serving static asset");
        let request = UpstreamRequest::get(url, RedirectPolicy::Follow);
        Ok(self.upstream.fetch(request).await?)
    }
}
