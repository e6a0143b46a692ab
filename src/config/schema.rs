//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Path prefix, landing-page origin and allow-list.
    pub relay: RelayConfig,

    /// CDN mirror acceleration.
    pub mirror: MirrorConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Relay behaviour shared by every request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Route prefix the relay is mounted under. Must start and end with `/`.
    pub prefix: String,

    /// Origin serving the landing page and other static files.
    /// Unmatched paths are appended to it verbatim.
    pub asset_url: String,

    /// Substrings a target path must contain at least one of.
    /// Empty means every path is allowed.
    pub allow_list: Vec<String>,

    /// Maximum number of redirect hops followed for a single request.
    pub max_redirect_hops: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            prefix: "/".to_string(),
            asset_url: "https://hunshcn.github.io/gh-proxy/".to_string(),
            allow_list: Vec::new(),
            max_redirect_hops: 10,
        }
    }
}

/// jsDelivr-style mirror acceleration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Redirect blob/raw file views to the CDN instead of relaying them.
    pub jsdelivr: bool,

    /// CDN base that `owner/repo@ref/path` is appended to.
    pub cdn_base: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            jsdelivr: false,
            cdn_base: "https://cdn.jsdelivr.net/gh".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed until response headers are produced, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
