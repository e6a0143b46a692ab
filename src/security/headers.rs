//! Header hygiene for relayed traffic.
//!
//! # Responsibilities
//! - Build the outbound header set from the client's headers
//! - Strip hop-by-hop headers in both directions
//!
//! # Design Decisions
//! - Everything not listed here is forwarded untouched
//! - Headers named by `Connection` are hop-by-hop for that message too
//! - `host` is derived from the target URL by the client, never copied

use axum::http::{header, HeaderMap};

use crate::http::request::X_REQUEST_ID;

/// Headers that describe a single connection and must not be relayed.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in listed {
        headers.remove(name.as_str());
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Copy of the client's headers suitable for the upstream request.
pub fn outbound_request_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = incoming.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(X_REQUEST_ID);
    headers
}
