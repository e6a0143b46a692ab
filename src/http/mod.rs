//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (relay path, `?q=` shorthand, preflight detection)
//!     → [routing decides proxy / redirect / static]
//!     → response.rs (CORS, header stripping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
