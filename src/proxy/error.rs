//! Relay error taxonomy and its mapping onto HTTP responses.

use std::error::Error as StdError;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::proxy::upstream::UpstreamError;

/// Prefix of every 502 body the relay produces itself.
pub const INTERNAL_ERROR_PREFIX: &str = "cfworker error:\n";

/// Everything the relay can fail with before a response exists.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Target path rejected by the allow-list.
    #[error("blocked")]
    Blocked,

    /// Target or redirect location is not a usable URL.
    #[error("url error")]
    InvalidUrl,

    /// Upstream kept redirecting past the configured hop limit.
    #[error("redirect chain exceeded {0} hops")]
    RedirectLimit(usize),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),

    #[error("invalid static asset url: {0}")]
    AssetUrl(#[from] url::ParseError),
}

/// `err` followed by its chain of sources, one per line.
pub fn report(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// 502 carrying a diagnostic body, used for anything unexpected.
pub fn internal_error(detail: &str) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        format!("{INTERNAL_ERROR_PREFIX}{detail}"),
    )
        .into_response()
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::Blocked => (StatusCode::FORBIDDEN, "blocked").into_response(),
            RelayError::InvalidUrl => (StatusCode::NOT_FOUND, "url error").into_response(),
            RelayError::RedirectLimit(_) => {
                (StatusCode::LOOP_DETECTED, "too many redirects").into_response()
            }
            err @ (RelayError::Upstream(_) | RelayError::Response(_) | RelayError::AssetUrl(_)) => {
                tracing::error!(error = %report(&err), "Relay failed");
                internal_error(&report(&err))
            }
        }
    }
}
