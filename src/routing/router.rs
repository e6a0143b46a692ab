//! Route decision.
//!
//! # Responsibilities
//! - Turn a classified path into a proxy, redirect or static-fallback decision
//! - Rewrite blob views to raw downloads when relaying
//! - Rewrite blob and raw-content paths into CDN mirror URLs
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Mirror acceleration is the only runtime toggle consulted here
//! - Raw-content paths always go to the mirror

use std::sync::LazyLock;

use regex::Regex;

use crate::config::MirrorConfig;
use crate::routing::matcher::{classify, UrlShape};

static GITHUB_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://)?github\.com").expect("built-in host pattern")
});

static RAW_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://)?raw\.(?:githubusercontent|github)\.com").expect("built-in host pattern")
});

/// Splits `.../com/owner/repo` from the `ref/` segment that follows it.
static RAW_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?com/.+?/.+?)/(.+?/)").expect("built-in ref pattern")
});

/// What the relay does with a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Relay the (possibly rewritten) path through the proxy engine.
    Proxy { shape: UrlShape, path: String },
    /// Answer with a 302 to a mirror URL; nothing is fetched.
    Redirect { shape: UrlShape, location: String },
    /// No shape matched; serve from the static asset origin.
    StaticFallback { path: String },
}

impl Route {
    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Route::Proxy { shape, .. } | Route::Redirect { shape, .. } => shape.as_str(),
            Route::StaticFallback { .. } => "static",
        }
    }
}

/// Routes classified paths according to the mirror settings.
#[derive(Debug, Clone)]
pub struct Router {
    mirror: MirrorConfig,
}

impl Router {
    pub fn new(mirror: MirrorConfig) -> Self {
        Self { mirror }
    }

    /// Decide how to serve `path` (the request target with the prefix removed).
    pub fn route(&self, path: &str) -> Route {
        let Some(shape) = classify(path) else {
            return Route::StaticFallback {
                path: path.to_string(),
            };
        };

        match shape {
            UrlShape::BlobRaw if self.mirror.jsdelivr => Route::Redirect {
                shape,
                location: self.blob_to_cdn(path),
            },
            UrlShape::BlobRaw => Route::Proxy {
                shape,
                path: path.replacen("/blob/", "/raw/", 1),
            },
            UrlShape::RawContent => Route::Redirect {
                shape,
                location: self.raw_to_cdn(path),
            },
            _ => Route::Proxy {
                shape,
                path: path.to_string(),
            },
        }
    }

    /// `github.com/owner/repo/blob/ref/path` → `<cdn>/owner/repo@ref/path`
    fn blob_to_cdn(&self, path: &str) -> String {
        let path = path.replacen("/blob/", "@", 1);
        GITHUB_HOST
            .replace(&path, regex::NoExpand(&self.mirror.cdn_base))
            .into_owned()
    }

    /// `raw.githubusercontent.com/owner/repo/ref/path` → `<cdn>/owner/repo@ref/path`
    fn raw_to_cdn(&self, path: &str) -> String {
        let path = RAW_REF.replace(path, "${1}@${2}");
        RAW_HOST
            .replace(&path, regex::NoExpand(&self.mirror.cdn_base))
            .into_owned()
    }
}
