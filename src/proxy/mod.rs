//! Proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Route::Proxy(path)
//!     → engine.rs (preflight, allow-list, normalize, fetch, redirect rewrite)
//!     → upstream.rs (outbound exchange, streamed both ways)
//!     → http::response (CORS + header stripping)
//!
//! Route::StaticFallback(path)
//!     → assets.rs (asset origin + path, relayed untouched)
//! ```
//!
//! # Design Decisions
//! - No retries: every request reaches upstream once, plus redirect hops
//! - Redirect hops are a bounded loop, not recursion
//! - Failures become responses in error.rs, never panics

pub mod assets;
pub mod engine;
pub mod error;
pub mod upstream;

pub use assets::StaticAssets;
pub use engine::{normalize_target, ProxyEngine, ProxyState};
pub use error::RelayError;
pub use upstream::{HttpUpstream, RedirectPolicy, Upstream, UpstreamError, UpstreamRequest};
