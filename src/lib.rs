//! GitHub edge relay library.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http::server ──▶ http::request (prefix, ?q=)
//!                                   │
//!                                   ▼
//!                           routing::matcher (shape table)
//!                                   │
//!                                   ▼
//!                           routing::router
//!              ┌────────────────────┼─────────────────────┐
//!              ▼                    ▼                     ▼
//!       proxy::engine         302 to CDN mirror     proxy::assets
//!   (gate, fetch, redirects)                       (static fallback)
//!              │
//!              ▼
//!       http::response (CORS, header stripping) ──▶ Client
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
