//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Proxied request:
//!     → allow_list.rs (substring gate on the target path)
//!     → headers.rs (copy client headers, strip hop-by-hop)
//!     → Pass to upstream
//! ```
//!
//! # Design Decisions
//! - Empty allow-list is the explicit "allow all" setting, not an error
//! - Rejections are local decisions and never retried

pub mod allow_list;
pub mod headers;

pub use allow_list::AllowList;
