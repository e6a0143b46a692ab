//! Request inspection.
//!
//! # Responsibilities
//! - Extract the relay path (request target after the prefix)
//! - Detect the `?q=` shorthand and CORS preflight probes
//! - Expose the request ID assigned by the middleware
//!
//! # Design Decisions
//! - The relay path keeps the query string; upstream sees it verbatim
//! - Collapsed scheme slashes (`https:/github.com`) are restored

use std::sync::LazyLock;

use axum::http::{header, HeaderMap, Method, Uri};
use regex::Regex;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

static SCHEME_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?:/+").expect("built-in scheme pattern"));

/// Request ID set by the request-id layer, or "unknown".
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Host the client addressed, from the `Host` header or the URI authority.
pub fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Option<&'a str> {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .filter(|h| !h.is_empty())
}

/// Non-empty value of the first `q` query parameter, form-decoded.
pub fn shorthand_target(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// The request target with `prefix` removed and scheme slashes restored.
///
/// Returns `None` when the target lies outside the prefix.
pub fn relay_path(uri: &Uri, prefix: &str) -> Option<String> {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let rest = target.strip_prefix(prefix)?;
    Some(SCHEME_SLASHES.replace(rest, "https://").into_owned())
}

/// A browser CORS preflight: OPTIONS carrying `access-control-request-headers`.
pub fn is_preflight(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS && headers.contains_key(header::ACCESS_CONTROL_REQUEST_HEADERS)
}
