//! Response handling and transformation.
//!
//! # Responsibilities
//! - Inject permissive CORS headers into relayed responses
//! - Strip headers that restrict cross-origin use of relayed content
//! - Build the responses the relay produces itself (preflight, redirects, errors)
//!
//! # Design Decisions
//! - Status and body are never touched by the transformer
//! - Upstream CORS values are overwritten, not merged

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Methods advertised to preflight probes.
const PREFLIGHT_ALLOW_METHODS: &str = "GET,POST,PUT,PATCH,TRACE,DELETE,HEAD,OPTIONS";

/// Preflight cache lifetime: 20 days.
const PREFLIGHT_MAX_AGE: &str = "1728000";

/// Response headers that would stop the client from using relayed content.
const RESTRICTIVE_HEADERS: &[&str] = &[
    "content-security-policy",
    "content-security-policy-report-only",
    "clear-site-data",
];

/// Allow any origin to read the response and all of its headers.
pub fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
}

pub fn strip_restrictive(headers: &mut HeaderMap) {
    for name in RESTRICTIVE_HEADERS {
        headers.remove(*name);
    }
}

/// Apply the relay's header policy to a terminal response.
pub fn transform(mut response: Response) -> Response {
    let headers = response.headers_mut();
    apply_cors(headers);
    strip_restrictive(headers);
    response
}

/// Fixed 204 answer to a CORS preflight probe.
pub fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, PREFLIGHT_ALLOW_METHODS),
            (header::ACCESS_CONTROL_MAX_AGE, PREFLIGHT_MAX_AGE),
        ],
    )
        .into_response()
}

/// Redirect to `location`. Fails if `location` is not a valid header value.
pub fn redirect(status: StatusCode, location: &str) -> Result<Response, axum::http::Error> {
    Response::builder()
        .status(status)
        .header(header::LOCATION, location)
        .body(Body::empty())
}
