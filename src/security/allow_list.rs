//! Path allow-list gate.
//!
//! A target path passes when it contains at least one configured substring.
//! An empty list lets everything through.

/// Ordered set of substrings a relayed path must contain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    entries: Vec<String>,
}

impl AllowList {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Returns true if `path` may be relayed.
    pub fn permits(&self, path: &str) -> bool {
        self.entries.is_empty() || self.entries.iter().any(|e| path.contains(e.as_str()))
    }
}
