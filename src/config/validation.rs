//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and that URLs and
//! addresses actually parse. Every problem is reported, not just the first.

use std::fmt;

use alloy::primitives::Address;

use crate::chain::types::Commitment;
use crate::config::schema::SessionConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SessionConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let chain = &config.chain;
    check_http_url("chain.rpc_url", &chain.rpc_url, &mut errors);
    for (i, url) in chain.failover_urls.iter().enumerate() {
        check_http_url(&format!("chain.failover_urls[{}]", i), url, &mut errors);
    }
    // History lookups reject levels below `confirmed`, and the same level
    // governs confirmation.
    if chain.commitment == Commitment::Processed {
        errors.push(ValidationError::new(
            "chain.commitment",
            "must be 'confirmed' or 'finalized'",
        ));
    }
    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be greater than 0"));
    }
    if chain.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "chain.confirmation_timeout_secs",
            "must be greater than 0",
        ));
    }
    if chain.poll_interval_ms == 0 {
        errors.push(ValidationError::new("chain.poll_interval_ms", "must be greater than 0"));
    }
    if chain.detail_concurrency == 0 {
        errors.push(ValidationError::new("chain.detail_concurrency", "must be greater than 0"));
    }
    if let Some(limit) = chain.history_limit {
        if limit == 0 || limit > 1000 {
            errors.push(ValidationError::new("chain.history_limit", "must be within 1..=1000"));
        }
    }

    if config.transfer.demo_lamports == 0 {
        errors.push(ValidationError::new("transfer.demo_lamports", "must be greater than 0"));
    }

    let counter = &config.counter;
    if counter.enabled {
        check_http_url("counter.rpc_url", &counter.rpc_url, &mut errors);
        if counter.contract_address.parse::<Address>().is_err() {
            errors.push(ValidationError::new(
                "counter.contract_address",
                format!("'{}' is not a valid address", counter.contract_address),
            ));
        }
        if counter.rpc_timeout_secs == 0 {
            errors.push(ValidationError::new("counter.rpc_timeout_secs", "must be greater than 0"));
        }
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }
    if obs.refresh_interval_secs == 0 {
        errors.push(ValidationError::new(
            "observability.refresh_interval_secs",
            "must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e))),
    }
}
