//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check contact points parse and are unique
//! - Check policy settings are complete
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Socket timeouts and sizes are the caller's contract and are not range-checked

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{ClientConfig, PolicyKind};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("contact point '{address}' is not a valid ip[:port]: {reason}")]
    InvalidContactPoint { address: String, reason: String },

    #[error("contact point {0} is listed more than once")]
    DuplicateContactPoint(SocketAddr),

    #[error("policy 'dc_aware_round_robin' requires policy.local_dc")]
    MissingLocalDc,

    #[error("health.{0} must be at least 1")]
    ZeroThreshold(&'static str),

    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),

    #[error("metrics address '{0}' is not a valid socket address")]
    InvalidMetricsAddress(String),
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for cp in &config.contact_points {
        match cp.socket_addr() {
            Ok(addr) => {
                if !seen.insert(addr) {
                    errors.push(ValidationError::DuplicateContactPoint(addr));
                }
            }
            Err(e) => errors.push(ValidationError::InvalidContactPoint {
                address: cp.address.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if config.policy.kind == PolicyKind::DcAwareRoundRobin
        && config.policy.local_dc.as_deref().map_or(true, str::is_empty)
    {
        errors.push(ValidationError::MissingLocalDc);
    }

    if config.health.up_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold("up_threshold"));
    }
    if config.health.down_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold("down_threshold"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
