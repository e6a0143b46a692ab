//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate prefix shape, URLs, addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("relay.prefix `{0}` must start and end with '/'")]
    Prefix(String),

    #[error("{field} `{value}` is not an absolute http(s) URL")]
    Url { field: &'static str, value: String },

    #[error("relay.allow_list entry #{0} is empty")]
    EmptyAllowListEntry(usize),

    #[error("relay.max_redirect_hops must be at least 1")]
    RedirectHops,

    #[error("{field} `{value}` is not a socket address")]
    Address { field: &'static str, value: String },

    #[error("observability.log_format `{0}` is not one of: pretty, json")]
    LogFormat(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let prefix = &config.relay.prefix;
    if !prefix.starts_with('/') || !prefix.ends_with('/') {
        errors.push(ValidationError::Prefix(prefix.clone()));
    }

    check_url(&mut errors, "relay.asset_url", &config.relay.asset_url);
    check_url(&mut errors, "mirror.cdn_base", &config.mirror.cdn_base);

    for (i, entry) in config.relay.allow_list.iter().enumerate() {
        if entry.is_empty() {
            errors.push(ValidationError::EmptyAllowListEntry(i));
        }
    }

    if config.relay.max_redirect_hops == 0 {
        errors.push(ValidationError::RedirectHops);
    }

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::LogFormat(
            config.observability.log_format.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let ok = Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::Url {
            field,
            value: value.to_string(),
        });
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field,
            value: value.to_string(),
        });
    }
}
