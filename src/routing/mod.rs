//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request path (prefix removed)
//!     → matcher.rs (classify against the ordered shape table)
//!     → router.rs (proxy / mirror redirect / static fallback)
//!     → Return: Route
//! ```
//!
//! # Design Decisions
//! - Patterns compiled once, immutable at runtime
//! - Deterministic: same input always yields the same route
//! - First match wins (table order)

pub mod matcher;
pub mod router;

pub use matcher::{classify, is_known_target, UrlShape};
pub use router::{Route, Router};
