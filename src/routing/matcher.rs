//! URL shape classification.
//!
//! # Responsibilities
//! - Recognise the six upstream URL shapes the relay knows how to serve
//! - Ordered, first-match-wins classification for routing
//! - Unordered any-match check for redirect `location` validation
//!
//! # Design Decisions
//! - Patterns are anchored at the start and case-insensitive
//! - The optional `http(s)://` scheme is part of every pattern
//! - The two matching modes are kept as separate code paths: routing
//!   depends on table order, the redirect gate must not

use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexSet};

/// One of the upstream URL shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlShape {
    /// `github.com/owner/repo/(releases|archive)/...`
    ReleaseArchive,
    /// `github.com/owner/repo/(blob|raw)/...`
    BlobRaw,
    /// `github.com/owner/repo/(info|git-)...` (smart-HTTP endpoints)
    GitProtocol,
    /// `raw.githubusercontent.com/owner/repo/ref/path`
    RawContent,
    /// `gist.githubusercontent.com/user/id/...`
    Gist,
    /// `github.com/owner/repo/tags...`
    Tags,
}

impl UrlShape {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReleaseArchive => "release_archive",
            Self::BlobRaw => "blob_raw",
            Self::GitProtocol => "git_protocol",
            Self::RawContent => "raw_content",
            Self::Gist => "gist",
            Self::Tags => "tags",
        }
    }
}

impl fmt::Display for UrlShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape table in dispatch order.
const SHAPES: [(UrlShape, &str); 6] = [
    (
        UrlShape::ReleaseArchive,
        r"(?i)^(?:https?://)?github\.com/.+?/.+?/(?:releases|archive)/.*$",
    ),
    (
        UrlShape::BlobRaw,
        r"(?i)^(?:https?://)?github\.com/.+?/.+?/(?:blob|raw)/.*$",
    ),
    (
        UrlShape::GitProtocol,
        r"(?i)^(?:https?://)?github\.com/.+?/.+?/(?:info|git-).*$",
    ),
    (
        UrlShape::RawContent,
        r"(?i)^(?:https?://)?raw\.(?:githubusercontent|github)\.com/.+?/.+?/.+?/.+$",
    ),
    (
        UrlShape::Gist,
        r"(?i)^(?:https?://)?gist\.(?:githubusercontent|github)\.com/.+?/.+?/.+$",
    ),
    (
        UrlShape::Tags,
        r"(?i)^(?:https?://)?github\.com/.+?/.+?/tags.*$",
    ),
];

static ORDERED: LazyLock<Vec<(UrlShape, Regex)>> = LazyLock::new(|| {
    SHAPES
        .iter()
        .map(|(shape, pattern)| (*shape, Regex::new(pattern).expect("built-in shape pattern")))
        .collect()
});

static ANY: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(SHAPES.iter().map(|(_, pattern)| *pattern)).expect("built-in shape patterns")
});

/// Classify a path for routing. The first shape in table order wins.
pub fn classify(path: &str) -> Option<UrlShape> {
    ORDERED
        .iter()
        .find(|(_, regex)| regex.is_match(path))
        .map(|(shape, _)| *shape)
}

/// Whether `location` matches any known shape, regardless of order.
///
/// Used to decide if an upstream redirect can be routed back through the relay.
pub fn is_known_target(location: &str) -> bool {
    ANY.is_match(location)
}
